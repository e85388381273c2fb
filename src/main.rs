//! Deployment health collector — binary entrypoint.
//! Wires the concrete collaborators (spool fetcher, base64/CSV parser,
//! SQLite store, env-configured notifiers) into the engine and runs it
//! until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use depmon_collector::config;
use depmon_collector::ingest::{csv::Base64CsvParser, dir_fetcher::DirFetcher};
use depmon_collector::notify::NotifierMux;
use depmon_collector::store::{ReportStore, SqliteStore};
use depmon_collector::{Collaborators, Engine};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("depmon_collector=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = config::load_default()?;

    let db_path = std::env::var("DEPMON_DB_PATH").unwrap_or_else(|_| "data/depmon.db".into());
    let store: Arc<dyn ReportStore> = Arc::new(SqliteStore::open(&PathBuf::from(db_path))?);
    let notifier = Arc::new(NotifierMux::from_env(store.clone(), &settings.notification));

    let deps = Collaborators {
        fetcher: Arc::new(DirFetcher),
        parser: Arc::new(Base64CsvParser),
        store,
        notifier,
    };

    let mut engine = Engine::new(deps);
    engine.start(&settings).await?;
    tracing::info!("collector running, Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    engine.stop().await?;
    Ok(())
}
