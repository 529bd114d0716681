//! Resource list controller: the authoritative in-memory collection for one entity type.

use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use db::{
    gateway::{Gateway, GatewayError},
    models::{
        record::{EntityRecord, RecordId},
        table::Table,
    },
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    auth::CurrentUser,
    confirmation::Confirm,
    entities::EntityConfig,
    list_query::ListQuery,
    notification::{Notification, Notifier},
    validator::ValidatedFields,
};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("cancelled by user")]
    UserAborted,
    #[error("{table} record {id} is not in the loaded collection")]
    NotFound { table: Table, id: RecordId },
    #[error("fields validated for {actual} cannot be saved to {expected}")]
    WrongTable { expected: Table, actual: Table },
}

impl ResourceError {
    /// Declined confirmations are no-ops, not failures
    pub fn is_user_aborted(&self) -> bool {
        matches!(self, Self::UserAborted)
    }
}

/// Where a controller's records come from
#[derive(Clone)]
pub enum ResourceSource {
    /// Fixed in-memory records; mutations stay local and ids are synthetic
    StaticSeed,
    GatewayBacked(Arc<dyn Gateway>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

pub struct ResourceListController {
    config: Arc<EntityConfig>,
    source: ResourceSource,
    notifier: Arc<dyn Notifier>,
    user: CurrentUser,
    records: Vec<EntityRecord>,
    state: LoadState,
    last_error: Option<String>,
}

impl ResourceListController {
    pub fn new(
        config: EntityConfig,
        source: ResourceSource,
        notifier: Arc<dyn Notifier>,
        user: CurrentUser,
    ) -> Self {
        Self {
            config: Arc::new(config),
            source,
            notifier,
            user,
            records: Vec::new(),
            state: LoadState::Unloaded,
            last_error: None,
        }
    }

    pub fn static_seed(
        config: EntityConfig,
        notifier: Arc<dyn Notifier>,
        user: CurrentUser,
    ) -> Self {
        Self::new(config, ResourceSource::StaticSeed, notifier, user)
    }

    pub fn gateway_backed(
        config: EntityConfig,
        gateway: Arc<dyn Gateway>,
        notifier: Arc<dyn Notifier>,
        user: CurrentUser,
    ) -> Self {
        Self::new(config, ResourceSource::GatewayBacked(gateway), notifier, user)
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    pub fn table(&self) -> Table {
        self.config.table
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&EntityRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Message of the last failed operation, cleared by the next successful load
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_static(&self) -> bool {
        matches!(self.source, ResourceSource::StaticSeed)
    }

    pub fn query(&self, query: &ListQuery) -> Vec<&EntityRecord> {
        query.apply(&self.records, self.config.search_fields)
    }

    pub(crate) fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    /// Fetch the full collection. Repeated loads replace the collection rather than append
    /// to it; on failure the previous collection is kept and the error is recorded.
    pub async fn load(&mut self) -> Result<(), ResourceError> {
        let table = self.table();
        let first_load = self.state == LoadState::Unloaded;
        self.state = LoadState::Loading;

        let gateway = match &self.source {
            ResourceSource::StaticSeed => {
                if first_load {
                    // records created before the first load stay ahead of the seed
                    let mut records = std::mem::take(&mut self.records);
                    records.extend(self.config.seed_records());
                    self.records = dedupe(records);
                }
                self.state = LoadState::Loaded;
                debug!(table = %table, count = self.records.len(), "Loaded static seed");
                return Ok(());
            }
            ResourceSource::GatewayBacked(gateway) => gateway.clone(),
        };

        match gateway.select(table, &self.config.select_query()).await {
            Ok(records) => {
                self.records = dedupe(records);
                self.state = LoadState::Loaded;
                self.last_error = None;
                debug!(table = %table, count = self.records.len(), "Loaded records");
                Ok(())
            }
            Err(e) => {
                warn!(
                    table = %table,
                    error = %e,
                    "Failed to load records, keeping last collection"
                );
                self.state = LoadState::Loaded;
                Err(self.reject("Erro ao carregar", e))
            }
        }
    }

    fn check_table(&self, fields: &ValidatedFields) -> Result<(), ResourceError> {
        if fields.table() != self.table() {
            return Err(ResourceError::WrongTable {
                expected: self.table(),
                actual: fields.table(),
            });
        }
        Ok(())
    }

    /// Insert a validated record. The local collection only changes once the gateway
    /// has accepted it.
    pub async fn create(
        &mut self,
        fields: ValidatedFields,
    ) -> Result<EntityRecord, ResourceError> {
        self.check_table(&fields)?;
        let table = self.table();

        let record = match &self.source {
            ResourceSource::StaticSeed => {
                let now = Utc::now();
                let mut record = EntityRecord::new(self.next_synthetic_id(), fields.into_fields());
                record.created_at = Some(now);
                record.updated_at = Some(now);
                record
            }
            ResourceSource::GatewayBacked(gateway) => {
                match gateway
                    .insert(table, fields.fields(), &self.config.joins)
                    .await
                {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(
                            table = %table,
                            actor = %self.user,
                            error = %e,
                            "Create rejected by gateway"
                        );
                        return Err(self.reject("Erro ao cadastrar", e));
                    }
                }
            }
        };

        self.merge_front(record.clone());
        info!(table = %table, record_id = %record.id, actor = %self.user, "Record created");
        Ok(record)
    }

    /// Replace record `id` with the gateway-confirmed version of `fields`
    pub async fn update(
        &mut self,
        id: RecordId,
        fields: ValidatedFields,
    ) -> Result<EntityRecord, ResourceError> {
        self.check_table(&fields)?;
        let table = self.table();
        let Some(current) = self.get(id) else {
            return Err(self.missing("Erro ao atualizar", id));
        };

        let record = match &self.source {
            ResourceSource::StaticSeed => {
                let mut record = current.clone();
                record.fields.extend(fields.into_fields());
                record.updated_at = Some(Utc::now());
                record
            }
            ResourceSource::GatewayBacked(gateway) => {
                match gateway
                    .update(table, id, fields.fields(), &self.config.joins)
                    .await
                {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(
                            table = %table,
                            record_id = %id,
                            actor = %self.user,
                            error = %e,
                            "Update rejected by gateway"
                        );
                        return Err(self.reject("Erro ao atualizar", e));
                    }
                }
            }
        };

        if let Some(slot) = self.records.iter_mut().find(|r| r.id == id) {
            *slot = record.clone();
        }
        info!(table = %table, record_id = %id, actor = %self.user, "Record updated");
        Ok(record)
    }

    /// Delete record `id` after the user confirms. Declining returns
    /// [`ResourceError::UserAborted`] without contacting the gateway or notifying.
    pub async fn delete(
        &mut self,
        id: RecordId,
        confirm: &dyn Confirm,
    ) -> Result<(), ResourceError> {
        let table = self.table();
        if self.get(id).is_none() {
            return Err(self.missing("Erro ao excluir", id));
        }

        if !confirm.confirm(self.config.messages.delete_prompt).await {
            debug!(table = %table, record_id = %id, "Delete cancelled by user");
            return Err(ResourceError::UserAborted);
        }

        if let ResourceSource::GatewayBacked(gateway) = &self.source {
            if let Err(e) = gateway.delete(table, id).await {
                warn!(
                    table = %table,
                    record_id = %id,
                    actor = %self.user,
                    error = %e,
                    "Delete rejected by gateway"
                );
                return Err(self.reject("Erro ao excluir", e));
            }
        }

        self.records.retain(|r| r.id != id);
        info!(table = %table, record_id = %id, actor = %self.user, "Record deleted");
        self.notify(Notification::success(self.config.messages.deleted, None));
        Ok(())
    }

    /// Record a gateway failure and tell the user, e.g. "Erro ao cadastrar produto"
    fn reject(&mut self, action: &str, error: GatewayError) -> ResourceError {
        let message = error.to_string();
        self.notify(Notification::error(
            format!("{action} {}", self.config.label.to_lowercase()),
            message.clone(),
        ));
        self.last_error = Some(message);
        error.into()
    }

    fn missing(&self, action: &str, id: RecordId) -> ResourceError {
        let error = ResourceError::NotFound {
            table: self.table(),
            id,
        };
        warn!(table = %self.table(), record_id = %id, "Record is not in the loaded collection");
        self.notify(Notification::error(
            format!("{action} {}", self.config.label.to_lowercase()),
            error.to_string(),
        ));
        error
    }

    /// Replace an already-present record in place, otherwise prepend it (newest first)
    fn merge_front(&mut self, record: EntityRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record,
            None => self.records.insert(0, record),
        }
    }

    /// Timestamp-derived placeholder id for local-only records
    fn next_synthetic_id(&self) -> RecordId {
        let now = Utc::now().timestamp_millis();
        let highest = self.records.iter().map(|r| r.id.0).max().unwrap_or(i64::MIN);
        RecordId(now.max(highest.saturating_add(1)))
    }
}

/// Keep the first occurrence of every id
fn dedupe(records: Vec<EntityRecord>) -> Vec<EntityRecord> {
    let mut seen = HashSet::new();
    records.into_iter().filter(|r| seen.insert(r.id)).collect()
}
