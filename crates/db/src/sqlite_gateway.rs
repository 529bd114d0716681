//! Gateway implementation over the local SQLite `records` table.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::{
    gateway::{Gateway, GatewayError, Join, SelectQuery, SortDirection, SortKey},
    models::{
        record::{EntityRecord, FieldValue, Fields, JoinedRecord, RecordId},
        table::Table,
    },
};

#[derive(Debug, FromRow)]
struct RecordRow {
    id: i64,
    fields: String,
    created_at: String,
    updated_at: String,
}

impl RecordRow {
    fn into_record(self) -> Result<EntityRecord, GatewayError> {
        Ok(EntityRecord {
            id: RecordId(self.id),
            fields: serde_json::from_str(&self.fields)?,
            joined: BTreeMap::new(),
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        })
    }
}

fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// JSON path of a field's scalar inside the stored `fields` document
fn value_path(field: &str) -> String {
    format!("$.\"{}\".value", field.replace('"', ""))
}

#[derive(Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_row(
        &self,
        table: Table,
        id: RecordId,
    ) -> Result<Option<RecordRow>, GatewayError> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"SELECT id, fields, created_at, updated_at
               FROM records
               WHERE table_name = $1 AND id = $2"#,
        )
        .bind(table.to_string())
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn resolve_joins(
        &self,
        record: &mut EntityRecord,
        joins: &[Join],
    ) -> Result<(), GatewayError> {
        for join in joins {
            let referenced = match record.get(&join.field).and_then(FieldValue::as_record_id) {
                Some(id) => self.find_row(join.table, id).await?,
                None => None,
            };
            let resolved = match referenced {
                Some(row) => Some(JoinedRecord {
                    id: RecordId(row.id),
                    fields: serde_json::from_str(&row.fields)?,
                }),
                None => None,
            };
            record.joined.insert(join.alias.clone(), resolved);
        }
        Ok(())
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &FieldValue) {
    match value {
        FieldValue::Null => {
            builder.push(" IS NULL");
        }
        FieldValue::Text(text) => {
            builder.push(" = ").push_bind(text.clone());
        }
        FieldValue::Number(number) => {
            builder.push(" = ").push_bind(*number);
        }
        FieldValue::Date(date) => {
            builder
                .push(" = ")
                .push_bind(date.format("%Y-%m-%d").to_string());
        }
    }
}

#[async_trait]
impl Gateway for SqliteGateway {
    async fn select(
        &self,
        table: Table,
        query: &SelectQuery,
    ) -> Result<Vec<EntityRecord>, GatewayError> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, fields, created_at, updated_at FROM records WHERE table_name = ",
        );
        builder.push_bind(table.to_string());

        for filter in &query.filters {
            builder
                .push(" AND json_extract(fields, ")
                .push_bind(value_path(&filter.field))
                .push(")");
            push_value(&mut builder, &filter.value);
        }

        if let Some(order_by) = &query.order_by {
            let direction = match order_by.direction {
                SortDirection::Ascending => " ASC",
                SortDirection::Descending => " DESC",
            };
            builder.push(" ORDER BY ");
            match &order_by.key {
                SortKey::Id => {
                    builder.push("id");
                }
                SortKey::CreatedAt => {
                    builder.push("created_at");
                }
                SortKey::UpdatedAt => {
                    builder.push("updated_at");
                }
                SortKey::Field(field) => {
                    builder
                        .push("json_extract(fields, ")
                        .push_bind(value_path(field))
                        .push(")");
                }
            }
            builder.push(direction).push(", id").push(direction);
        }

        let rows = builder
            .build_query_as::<RecordRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = row.into_record()?;
            self.resolve_joins(&mut record, &query.joins).await?;
            if let Some(columns) = &query.columns {
                record.fields.retain(|name, _| columns.contains(name));
            }
            records.push(record);
        }

        debug!(table = %table, count = records.len(), "Selected records");
        Ok(records)
    }

    async fn insert(
        &self,
        table: Table,
        fields: &Fields,
        joins: &[Join],
    ) -> Result<EntityRecord, GatewayError> {
        let now = timestamp_now();
        let json = serde_json::to_string(fields)?;
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO records (table_name, fields, created_at, updated_at)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(table.to_string())
        .bind(json)
        .bind(now.as_str())
        .bind(now.as_str())
        .fetch_one(&self.pool)
        .await?;

        let mut record = EntityRecord {
            id: RecordId(id),
            fields: fields.clone(),
            joined: BTreeMap::new(),
            created_at: parse_timestamp(&now),
            updated_at: parse_timestamp(&now),
        };
        self.resolve_joins(&mut record, joins).await?;
        debug!(table = %table, record_id = %record.id, "Inserted record");
        Ok(record)
    }

    async fn update(
        &self,
        table: Table,
        id: RecordId,
        fields: &Fields,
        joins: &[Join],
    ) -> Result<EntityRecord, GatewayError> {
        let mut record = self
            .find_row(table, id)
            .await?
            .ok_or(GatewayError::NotFound { table, id })?
            .into_record()?;

        record
            .fields
            .extend(fields.iter().map(|(name, value)| (name.clone(), value.clone())));
        let now = timestamp_now();
        sqlx::query(
            r#"UPDATE records
               SET fields = $1,
                   updated_at = $2
               WHERE table_name = $3 AND id = $4"#,
        )
        .bind(serde_json::to_string(&record.fields)?)
        .bind(now.as_str())
        .bind(table.to_string())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        record.updated_at = parse_timestamp(&now);
        self.resolve_joins(&mut record, joins).await?;
        debug!(table = %table, record_id = %id, "Updated record");
        Ok(record)
    }

    async fn delete(&self, table: Table, id: RecordId) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM records WHERE table_name = $1 AND id = $2")
            .bind(table.to_string())
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound { table, id });
        }
        debug!(table = %table, record_id = %id, "Deleted record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DBService,
        gateway::{OrderBy, SortDirection},
    };

    async fn gateway() -> SqliteGateway {
        let db = DBService::in_memory().await.unwrap();
        SqliteGateway::new(db.pool)
    }

    fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_select_orders_newest_first() {
        let gateway = gateway().await;
        let first = gateway
            .insert(Table::Clients, &fields(&[("nome", "Maria Silva".into())]), &[])
            .await
            .unwrap();
        let second = gateway
            .insert(Table::Clients, &fields(&[("nome", "João Santos".into())]), &[])
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
        assert!(first.created_at.is_some());

        let records = gateway
            .select(
                Table::Clients,
                &SelectQuery::new().order_by(OrderBy::newest_first()),
            )
            .await
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_select_is_scoped_to_table() {
        let gateway = gateway().await;
        gateway
            .insert(Table::Clients, &fields(&[("nome", "Maria".into())]), &[])
            .await
            .unwrap();
        gateway
            .insert(Table::Products, &fields(&[("nome", "Ração".into())]), &[])
            .await
            .unwrap();

        let products = gateway
            .select(Table::Products, &SelectQuery::new())
            .await
            .unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].text("nome"), Some("Ração"));
    }

    #[tokio::test]
    async fn test_select_filters_orders_and_projects_fields() {
        let gateway = gateway().await;
        for (descricao, tipo, valor) in [
            ("Aluguel", "despesa", 1200.0),
            ("Venda", "receita", 450.0),
            ("Consulta", "receita", 150.0),
        ] {
            gateway
                .insert(
                    Table::Transactions,
                    &fields(&[
                        ("descricao", descricao.into()),
                        ("tipo", tipo.into()),
                        ("valor", valor.into()),
                    ]),
                    &[],
                )
                .await
                .unwrap();
        }

        let receitas = gateway
            .select(
                Table::Transactions,
                &SelectQuery::new()
                    .filter("tipo", "receita")
                    .order_by(OrderBy::field("valor", SortDirection::Ascending))
                    .columns(["descricao", "valor"]),
            )
            .await
            .unwrap();

        let values: Vec<_> = receitas.iter().filter_map(|r| r.number("valor")).collect();
        assert_eq!(values, vec![150.0, 450.0]);
        assert!(receitas.iter().all(|r| r.get("tipo").is_none()));
    }

    #[tokio::test]
    async fn test_joins_resolve_references_and_dangling_ones_are_none() {
        let gateway = gateway().await;
        let maria = gateway
            .insert(Table::Clients, &fields(&[("nome", "Maria Silva".into())]), &[])
            .await
            .unwrap();
        let join = Join::new("cliente_id", Table::Clients, "cliente");

        let rex = gateway
            .insert(
                Table::Animals,
                &fields(&[("nome", "Rex".into()), ("cliente_id", maria.id.into())]),
                std::slice::from_ref(&join),
            )
            .await
            .unwrap();
        let owner = rex.joined("cliente").unwrap();
        assert_eq!(owner.id, maria.id);
        assert_eq!(owner.get("nome"), Some(&FieldValue::text("Maria Silva")));

        gateway.delete(Table::Clients, maria.id).await.unwrap();
        let animals = gateway
            .select(Table::Animals, &SelectQuery::new().join(join))
            .await
            .unwrap();
        assert_eq!(animals.len(), 1);
        assert_eq!(animals[0].joined.get("cliente"), Some(&None));
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_rejects_unknown_ids() {
        let gateway = gateway().await;
        let product = gateway
            .insert(
                Table::Products,
                &fields(&[("nome", "Shampoo".into()), ("estoque", 12.0.into())]),
                &[],
            )
            .await
            .unwrap();

        let updated = gateway
            .update(
                Table::Products,
                product.id,
                &fields(&[("estoque", 10.0.into())]),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(updated.text("nome"), Some("Shampoo"));
        assert_eq!(updated.number("estoque"), Some(10.0));
        assert_eq!(updated.created_at, product.created_at);

        let missing = gateway
            .update(Table::Products, RecordId(999), &Fields::new(), &[])
            .await;
        assert!(matches!(missing, Err(GatewayError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let gateway = gateway().await;
        let result = gateway.delete(Table::Sales, RecordId(42)).await;
        assert!(matches!(
            result,
            Err(GatewayError::NotFound { table: Table::Sales, id: RecordId(42) })
        ));
    }
}
