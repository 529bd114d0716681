//! Summary figures reduced from loaded collections.

use chrono::{Datelike, NaiveDate};
use db::models::record::EntityRecord;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, TS)]
pub struct FinancialSummary {
    pub receitas: f64,
    pub despesas: f64,
    pub saldo: f64,
}

impl FinancialSummary {
    pub fn from_transactions<'a>(
        transactions: impl IntoIterator<Item = &'a EntityRecord>,
    ) -> Self {
        let (receitas, despesas) =
            transactions.into_iter().fold((0.0, 0.0), |(receitas, despesas), t| {
                let valor = t.number("valor").unwrap_or(0.0);
                match t.text("tipo") {
                    Some("receita") => (receitas + valor, despesas),
                    Some("despesa") => (receitas, despesas + valor),
                    _ => (receitas, despesas),
                }
            });
        Self {
            receitas,
            despesas,
            saldo: receitas - despesas,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, TS)]
pub struct SalesSummary {
    pub count: usize,
    pub total: f64,
    pub pending: usize,
    pub cancelled: usize,
}

impl SalesSummary {
    /// Every sale dated `day`, whatever its status, counts toward the total
    pub fn on_day(sales: &[EntityRecord], day: NaiveDate) -> Self {
        sales
            .iter()
            .filter(|s| s.date("data") == Some(day))
            .fold(Self::default(), |mut summary, sale| {
                summary.count += 1;
                summary.total += sale.number("total").unwrap_or(0.0);
                match sale.text("status") {
                    Some("pendente") => summary.pending += 1,
                    Some("cancelada") => summary.cancelled += 1,
                    _ => {}
                }
                summary
            })
    }
}

/// Products whose stock has reached the configured minimum
pub fn low_stock(products: &[EntityRecord]) -> Vec<&EntityRecord> {
    products
        .iter()
        .filter(|p| match (p.number("estoque"), p.number("estoque_minimo")) {
            (Some(estoque), Some(minimo)) => estoque <= minimo,
            _ => false,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, TS)]
pub struct DashboardSummary {
    pub clients: usize,
    pub animals: usize,
    pub appointments_today: usize,
    pub month_revenue: f64,
}

impl DashboardSummary {
    pub fn compute(
        clients: &[EntityRecord],
        animals: &[EntityRecord],
        appointments: &[EntityRecord],
        transactions: &[EntityRecord],
        today: NaiveDate,
    ) -> Self {
        let same_month = |d: NaiveDate| d.year() == today.year() && d.month() == today.month();
        let month = transactions
            .iter()
            .filter(|t| t.date("data").is_some_and(same_month));
        Self {
            clients: clients.len(),
            animals: animals.len(),
            appointments_today: appointments
                .iter()
                .filter(|a| a.date("data") == Some(today))
                .count(),
            month_revenue: FinancialSummary::from_transactions(month).receitas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::entities::{appointments, clients, products, sales, transactions};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_financial_summary() {
        let summary = FinancialSummary::from_transactions(&transactions().seed_records());
        assert_eq!(summary.receitas, 600.0);
        assert_eq!(summary.despesas, 1430.0);
        assert_eq!(summary.saldo, -830.0);
        assert_eq!(
            FinancialSummary::from_transactions(std::iter::empty()),
            FinancialSummary::default()
        );
    }

    #[test]
    fn test_sales_on_day() {
        let mut seed = sales().seed_records();
        let summary = SalesSummary::on_day(&seed, day(15));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.cancelled, 0);
        assert!((summary.total - 239.9).abs() < 1e-9);
        assert_eq!(SalesSummary::on_day(&seed, day(20)).count, 0);

        seed[0].fields.insert("status".to_string(), "cancelada".into());
        let summary = SalesSummary::on_day(&seed, day(15));
        assert_eq!(summary.cancelled, 1);
        assert!((summary.total - 239.9).abs() < 1e-9);
    }

    #[test]
    fn test_low_stock() {
        let mut seed = products().seed_records();
        assert!(low_stock(&seed).is_empty());
        seed[1].fields.insert("estoque".to_string(), 10.0.into());
        let low: Vec<_> = low_stock(&seed).iter().map(|p| p.id).collect();
        assert_eq!(low, vec![seed[1].id]);
    }

    #[test]
    fn test_dashboard() {
        let summary = DashboardSummary::compute(
            &clients().seed_records(),
            &[],
            &appointments().seed_records(),
            &transactions().seed_records(),
            day(15),
        );
        assert_eq!(summary.clients, 2);
        assert_eq!(summary.animals, 0);
        assert_eq!(summary.appointments_today, 2);
        assert_eq!(summary.month_revenue, 600.0);
    }
}
