//! Table-oriented create/read/update/delete contract consumed by the resource controllers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::models::{
    record::{EntityRecord, FieldValue, Fields, RecordId},
    table::Table,
};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("json error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{table} record {id} not found")]
    NotFound { table: Table, id: RecordId },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rejected by backend: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    CreatedAt,
    UpdatedAt,
    Field(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct OrderBy {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl OrderBy {
    /// Newest first, the ordering every list screen uses
    pub fn newest_first() -> Self {
        Self {
            key: SortKey::CreatedAt,
            direction: SortDirection::Descending,
        }
    }

    pub fn field(name: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: SortKey::Field(name.into()),
            direction,
        }
    }
}

/// Equality filter on one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Filter {
    pub field: String,
    pub value: FieldValue,
}

/// Resolve the reference held in `field` to a record of `table`, exposed under `alias`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Join {
    pub field: String,
    pub table: Table,
    pub alias: String,
}

impl Join {
    pub fn new(field: impl Into<String>, table: Table, alias: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            table,
            alias: alias.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct SelectQuery {
    /// Field projection; `None` returns every field
    pub columns: Option<Vec<String>>,
    pub order_by: Option<OrderBy>,
    pub filters: Vec<Filter>,
    pub joins: Vec<Join>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }
}

/// Hosted backend exposing per-table select/insert/update/delete
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn select(
        &self,
        table: Table,
        query: &SelectQuery,
    ) -> Result<Vec<EntityRecord>, GatewayError>;

    /// Insert a record; the returned record carries the assigned id and resolved joins
    async fn insert(
        &self,
        table: Table,
        fields: &Fields,
        joins: &[Join],
    ) -> Result<EntityRecord, GatewayError>;

    /// Merge `fields` into the record `id` and return the stored result
    async fn update(
        &self,
        table: Table,
        id: RecordId,
        fields: &Fields,
        joins: &[Join],
    ) -> Result<EntityRecord, GatewayError>;

    async fn delete(&self, table: Table, id: RecordId) -> Result<(), GatewayError>;
}
