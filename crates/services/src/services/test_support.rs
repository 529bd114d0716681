//! In-memory gateway with scripted failures for controller tests.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::Utc;
use db::{
    gateway::{Gateway, GatewayError, Join, SelectQuery},
    models::{
        record::{EntityRecord, Fields, RecordId},
        table::Table,
    },
};

use super::validator::FormValues;

pub(crate) fn form(pairs: &[(&str, &str)]) -> FormValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CallCounts {
    pub select: usize,
    pub insert: usize,
    pub update: usize,
    pub delete: usize,
}

#[derive(Default)]
struct State {
    rows: BTreeMap<Table, Vec<EntityRecord>>,
    fail_next: Option<String>,
    calls: CallCounts,
}

impl State {
    fn take_failure(&mut self) -> Result<(), GatewayError> {
        match self.fail_next.take() {
            Some(message) => Err(GatewayError::Transport(message)),
            None => Ok(()),
        }
    }

    fn resolve(&self, mut record: EntityRecord, joins: &[Join]) -> EntityRecord {
        for join in joins {
            let target = record
                .get(&join.field)
                .and_then(|v| v.as_record_id())
                .and_then(|id| {
                    self.rows
                        .get(&join.table)
                        .and_then(|rows| rows.iter().find(|r| r.id == id))
                })
                .map(EntityRecord::as_joined);
            record.joined.insert(join.alias.clone(), target);
        }
        record
    }
}

/// Echoes inserts with sequential ids per table (starting after the highest seeded id)
#[derive(Clone, Default)]
pub(crate) struct ScriptedGateway {
    state: Arc<Mutex<State>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: Table, records: Vec<EntityRecord>) {
        self.state.lock().unwrap().rows.insert(table, records);
    }

    /// Make the next gateway call fail with a transport error
    pub fn fail_next(&self, message: &str) {
        self.state.lock().unwrap().fail_next = Some(message.to_string());
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls
    }

    pub fn rows(&self, table: Table) -> Vec<EntityRecord> {
        self.state
            .lock()
            .unwrap()
            .rows
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn select(
        &self,
        table: Table,
        query: &SelectQuery,
    ) -> Result<Vec<EntityRecord>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.select += 1;
        state.take_failure()?;
        let rows = state.rows.get(&table).cloned().unwrap_or_default();
        Ok(rows
            .into_iter()
            .rev()
            .map(|r| state.resolve(r, &query.joins))
            .collect())
    }

    async fn insert(
        &self,
        table: Table,
        fields: &Fields,
        joins: &[Join],
    ) -> Result<EntityRecord, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.insert += 1;
        state.take_failure()?;
        let rows = state.rows.entry(table).or_default();
        let next = rows.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        let mut record = EntityRecord::new(RecordId(next), fields.clone());
        record.created_at = Some(Utc::now());
        record.updated_at = record.created_at;
        rows.push(record.clone());
        Ok(state.resolve(record, joins))
    }

    async fn update(
        &self,
        table: Table,
        id: RecordId,
        fields: &Fields,
        joins: &[Join],
    ) -> Result<EntityRecord, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.update += 1;
        state.take_failure()?;
        let record = state
            .rows
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .map(|record| {
                record.fields.extend(fields.clone());
                record.updated_at = Some(Utc::now());
                record.clone()
            })
            .ok_or(GatewayError::NotFound { table, id })?;
        Ok(state.resolve(record, joins))
    }

    async fn delete(&self, table: Table, id: RecordId) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete += 1;
        state.take_failure()?;
        let rows = state.rows.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(GatewayError::NotFound { table, id });
        }
        Ok(())
    }
}
