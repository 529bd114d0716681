use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use db::models::table::Table;
use services::services::{
    auth::CurrentUser, config::ConsoleConfig, console::Console, notification::TracingNotifier,
};
use strum::IntoEnumIterator;
use tracing::{info, warn};
use utils::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConsoleConfig::from_env().context("invalid console configuration")?;
    init_tracing(&config.log_filter);
    info!(data_mode = %config.data_mode, "Starting pet shop console");

    let user = CurrentUser::guest();
    let mut console = Console::open(&config, Arc::new(TracingNotifier), user.clone())
        .await
        .with_context(|| format!("could not open {}", config.database_url))?;

    let failed = console.load_all().await;
    if !failed.is_empty() {
        warn!(?failed, "Some screens could not be loaded");
    }

    for table in Table::iter() {
        if let Some(screen) = console.screen(table) {
            info!(table = %table, records = screen.len(), "Screen ready");
        }
    }

    let today = Local::now().date_naive();
    let dashboard = console.dashboard(today);
    info!(
        actor = %user,
        summary = %serde_json::to_string(&dashboard)?,
        low_stock = console.low_stock_count(),
        "Dashboard"
    );
    Ok(())
}
