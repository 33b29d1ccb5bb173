use std::sync::Arc;

use sales_targets_core::facts::AgentDirectory;
use sales_targets_core::targets::TargetService;
use sales_targets_storage_sqlite::db::{self, spawn_writer};
use sales_targets_storage_sqlite::DeltaRepository;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub target_service: Arc<TargetService>,
}

/// Installs the global subscriber. Logs go to stderr so stdout stays JSON.
pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let delta_repository = Arc::new(DeltaRepository::new(pool, writer));
    let target_service = TargetService::new(delta_repository)
        .with_agent_directory(AgentDirectory::parse(&config.agent_labels))
        .with_report_customer_cap(config.report_customer_cap);

    Ok(AppState {
        target_service: Arc::new(target_service),
    })
}
