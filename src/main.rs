use std::{str::FromStr, sync::Arc};

use dotenv::dotenv;
use tracing_subscriber::filter::LevelFilter;

use reelmarket::{
    config::Config,
    db::db::DBClient,
    service::{background_jobs::start_bridge_reconciliation_job, payment_provider::build_payment_provider},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::init()?;

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from_str(&config.log_level).unwrap_or(LevelFilter::INFO))
        .init();

    let db_client = match DBClient::connect(&config.database_url, config.database_max_connections).await {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("Failed to connect to the database: {}", err);
            return Err(err.into());
        }
    };

    let payment_provider = build_payment_provider(&config);
    let app_state = Arc::new(AppState::new(Arc::new(db_client), payment_provider, config));

    tokio::spawn(start_bridge_reconciliation_job(app_state.clone()));
    tracing::info!(
        "Commerce engine running, reconciling paid orders every {}s",
        app_state.env.bridge_reconcile_interval_secs
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}
