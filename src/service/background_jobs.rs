// service/background_jobs.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::AppState;

const RECONCILE_BATCH_SIZE: i64 = 50;

/// Re-run the bridge for orders that were paid but never provisioned.
pub async fn start_bridge_reconciliation_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(
        app_state.env.bridge_reconcile_interval_secs,
    ));

    loop {
        interval.tick().await;

        tracing::debug!("Running bridge reconciliation job at {}", Utc::now());

        match app_state
            .order_bridge
            .reconcile_paid_orders(RECONCILE_BATCH_SIZE)
            .await
        {
            Ok(0) => {}
            Ok(count) => tracing::info!("Bridge reconciliation provisioned {} order(s)", count),
            Err(e) => tracing::error!("Bridge reconciliation job failed: {}", e),
        }
    }
}
