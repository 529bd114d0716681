//! The seven resource screens wired to one data source.

use std::{collections::BTreeMap, sync::Arc};

use chrono::NaiveDate;
use db::{
    DBService,
    gateway::{Gateway, GatewayError},
    models::table::Table,
    sqlite_gateway::SqliteGateway,
};
use strum::IntoEnumIterator;
use tracing::{info, warn};

use super::{
    auth::CurrentUser,
    config::{ConsoleConfig, DataMode},
    entities::EntityConfig,
    notification::Notifier,
    reports::{DashboardSummary, FinancialSummary, SalesSummary, low_stock},
    resource::{ResourceListController, ResourceSource},
};

pub struct Console {
    screens: BTreeMap<Table, ResourceListController>,
}

impl Console {
    fn build(source: ResourceSource, notifier: Arc<dyn Notifier>, user: CurrentUser) -> Self {
        let screens = Table::iter()
            .map(|table| {
                let controller = ResourceListController::new(
                    EntityConfig::for_table(table),
                    source.clone(),
                    notifier.clone(),
                    user.clone(),
                );
                (table, controller)
            })
            .collect();
        Self { screens }
    }

    pub fn static_seed(notifier: Arc<dyn Notifier>, user: CurrentUser) -> Self {
        Self::build(ResourceSource::StaticSeed, notifier, user)
    }

    pub fn gateway_backed(
        gateway: Arc<dyn Gateway>,
        notifier: Arc<dyn Notifier>,
        user: CurrentUser,
    ) -> Self {
        Self::build(ResourceSource::GatewayBacked(gateway), notifier, user)
    }

    /// Build every screen from `config`, opening the database when the data mode asks for it
    pub async fn open(
        config: &ConsoleConfig,
        notifier: Arc<dyn Notifier>,
        user: CurrentUser,
    ) -> Result<Self, GatewayError> {
        match config.data_mode {
            DataMode::StaticSeed => Ok(Self::static_seed(notifier, user)),
            DataMode::Gateway => {
                let db = DBService::new(&config.database_url).await?;
                let gateway = Arc::new(SqliteGateway::new(db.pool));
                Ok(Self::gateway_backed(gateway, notifier, user))
            }
        }
    }

    /// Load every screen, returning the tables whose load failed
    pub async fn load_all(&mut self) -> Vec<Table> {
        let mut failed = Vec::new();
        for (table, screen) in self.screens.iter_mut() {
            if let Err(e) = screen.load().await {
                warn!(table = %table, error = %e, "Screen kept its previous records");
                failed.push(*table);
            }
        }
        info!(
            screens = self.screens.len(),
            failed = failed.len(),
            "Console loaded"
        );
        failed
    }

    pub fn screen(&self, table: Table) -> Option<&ResourceListController> {
        self.screens.get(&table)
    }

    pub fn screen_mut(&mut self, table: Table) -> Option<&mut ResourceListController> {
        self.screens.get_mut(&table)
    }

    fn records(&self, table: Table) -> &[db::models::record::EntityRecord] {
        self.screens
            .get(&table)
            .map(ResourceListController::records)
            .unwrap_or_default()
    }

    pub fn dashboard(&self, today: NaiveDate) -> DashboardSummary {
        DashboardSummary::compute(
            self.records(Table::Clients),
            self.records(Table::Animals),
            self.records(Table::Appointments),
            self.records(Table::Transactions),
            today,
        )
    }

    pub fn financial_summary(&self) -> FinancialSummary {
        FinancialSummary::from_transactions(self.records(Table::Transactions))
    }

    pub fn sales_on(&self, day: NaiveDate) -> SalesSummary {
        SalesSummary::on_day(self.records(Table::Sales), day)
    }

    pub fn low_stock_count(&self) -> usize {
        low_stock(self.records(Table::Products)).len()
    }
}

#[cfg(test)]
mod tests {
    use db::models::record::RecordId;

    use super::*;
    use crate::services::{
        confirmation::FixedAnswer,
        dialog::DialogController,
        notification::{NotificationKind, RecordingNotifier},
        test_support::form,
    };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_static_console_serves_seed_data() {
        let notifier = RecordingNotifier::new();
        let mut console = Console::static_seed(Arc::new(notifier.clone()), CurrentUser::guest());
        assert!(console.load_all().await.is_empty());

        let dashboard = console.dashboard(day(15));
        assert_eq!(dashboard.clients, 2);
        assert_eq!(dashboard.animals, 2);
        assert_eq!(dashboard.appointments_today, 2);
        assert_eq!(dashboard.month_revenue, 600.0);
        assert_eq!(console.financial_summary().saldo, -830.0);
        assert_eq!(console.sales_on(day(14)).count, 1);
        assert_eq!(console.low_stock_count(), 0);

        let transactions = console.screen_mut(Table::Transactions).unwrap();
        transactions.delete(RecordId(4), &FixedAnswer(true)).await.unwrap();
        assert_eq!(console.financial_summary().despesas, 230.0);
        assert_eq!(notifier.count(NotificationKind::Success), 1);
    }

    #[tokio::test]
    async fn test_gateway_console_over_sqlite() {
        let db = DBService::in_memory().await.unwrap();
        let gateway: Arc<dyn Gateway> = Arc::new(SqliteGateway::new(db.pool));
        let notifier = RecordingNotifier::new();
        let mut console =
            Console::gateway_backed(gateway, Arc::new(notifier.clone()), CurrentUser::guest());
        assert!(console.load_all().await.is_empty());
        assert_eq!(console.dashboard(day(15)), DashboardSummary::default());

        let clients = console.screen_mut(Table::Clients).unwrap();
        let mut dialog = DialogController::new();
        dialog.open(clients, None);
        for (field, value) in form(&[
            ("nome", "Maria Silva"),
            ("cpf", "123.456.789-00"),
            ("email", "maria.silva@email.com"),
            ("telefone", "(11) 99999-9999"),
            ("endereco", "Rua das Flores, 123"),
        ]) {
            dialog.set_field(field, value);
        }
        assert!(dialog.submit(clients).await.is_saved());
        let owner = clients.records()[0].id;

        let animals = console.screen_mut(Table::Animals).unwrap();
        dialog.open(animals, None);
        for (field, value) in form(&[
            ("nome", "Rex"),
            ("especie", "Cachorro"),
            ("raca", "Golden Retriever"),
            ("idade", "3 anos"),
            ("peso", "25 kg"),
            ("cliente_id", owner.to_string().as_str()),
        ]) {
            dialog.set_field(field, value);
        }
        assert!(dialog.submit(animals).await.is_saved());
        let rex = &animals.records()[0];
        let tutor = rex.joined("cliente").unwrap();
        assert_eq!(tutor.id, owner);
        assert_eq!(tutor.get("nome").unwrap().as_text(), Some("Maria Silva"));

        // reloading reads the persisted rows back without duplicating them
        assert!(console.load_all().await.is_empty());
        assert_eq!(console.screen(Table::Clients).unwrap().len(), 1);
        assert_eq!(console.screen(Table::Animals).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_in_static_mode_needs_no_database() {
        let config = ConsoleConfig {
            database_url: "sqlite:///nonexistent/dir/petshop.db".to_string(),
            ..ConsoleConfig::default()
        };
        let notifier = Arc::new(RecordingNotifier::new());
        let console = Console::open(&config, notifier, CurrentUser::guest())
            .await
            .unwrap();
        assert!(console.screen(Table::Sales).unwrap().is_static());
    }
}
