use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use ts_rs::TS;

/// Backend table holding one entity type
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Clients,
    Animals,
    Employees,
    Products,
    Appointments,
    Sales,
    /// Financial transactions (receitas and despesas)
    Transactions,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_table_names_round_trip_through_strings() {
        for table in Table::iter() {
            assert_eq!(Table::from_str(&table.to_string()).unwrap(), table);
        }
        assert_eq!(Table::Transactions.to_string(), "transactions");
        assert!(Table::from_str("invoices").is_err());
    }
}
