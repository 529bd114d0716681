//! Client-side search and filtering over a loaded collection.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use db::models::record::{EntityRecord, FieldValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub field: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    fn contains(&self, record: &EntityRecord) -> bool {
        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        let Some(date) = record.date(&self.field) else {
            return false;
        };
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: String,
    /// Exact matches on a field's form representation; empty values are ignored
    pub filters: BTreeMap<String, String>,
    pub date_range: Option<DateRange>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn between(
        mut self,
        field: impl Into<String>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Self {
        self.date_range = Some(DateRange {
            field: field.into(),
            from,
            to,
        });
        self
    }

    pub fn matches(&self, record: &EntityRecord, search_fields: &[&str]) -> bool {
        self.matches_search(record, search_fields)
            && self.matches_filters(record)
            && self
                .date_range
                .as_ref()
                .is_none_or(|range| range.contains(record))
    }

    fn matches_search(&self, record: &EntityRecord, search_fields: &[&str]) -> bool {
        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        search_fields.iter().any(|field| {
            record
                .get(field)
                .map(FieldValue::to_form_string)
                .is_some_and(|value| value.to_lowercase().contains(&term))
        })
    }

    fn matches_filters(&self, record: &EntityRecord) -> bool {
        self.filters
            .iter()
            .filter(|(_, expected)| !expected.is_empty())
            .all(|(field, expected)| {
                record
                    .get(field)
                    .is_some_and(|value| value.to_form_string() == *expected)
            })
    }

    pub fn apply<'a>(
        &self,
        records: &'a [EntityRecord],
        search_fields: &[&str],
    ) -> Vec<&'a EntityRecord> {
        records
            .iter()
            .filter(|record| self.matches(record, search_fields))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::entities::{employees, transactions};

    #[test]
    fn test_empty_query_matches_everything() {
        let config = transactions();
        let records = config.seed_records();
        assert_eq!(ListQuery::new().apply(&records, config.search_fields).len(), records.len());
    }

    #[test]
    fn test_search_is_case_insensitive_over_search_fields() {
        let config = employees();
        let records = config.seed_records();
        let found = ListQuery::new()
            .search("tosador")
            .apply(&records, config.search_fields);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text("nome"), Some("Ana Tosadora"));

        let by_cargo = ListQuery::new()
            .search("VETERIN")
            .apply(&records, config.search_fields);
        assert_eq!(by_cargo.len(), 1);
    }

    #[test]
    fn test_filters_and_date_range_combine() {
        let config = transactions();
        let records = config.seed_records();
        let query = ListQuery::new()
            .filter("tipo", "despesa")
            .filter("categoria", "")
            .filter("forma_pagamento", "Transferência");
        assert_eq!(query.apply(&records, config.search_fields).len(), 2);

        let january_mid = query.between(
            "data",
            NaiveDate::from_ymd_opt(2024, 1, 10),
            NaiveDate::from_ymd_opt(2024, 1, 31),
        );
        let found = january_mid.apply(&records, config.search_fields);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text("descricao"), Some("Compra de ração"));
    }
}
