use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::core::change_feed::ChangeFeed;
use crate::db::LibraryStore;
use crate::services::admin::refresh_fines;

/// Background job that persists the running fine of overdue loans.
pub fn start_fine_refresher(
    store: Arc<dyn LibraryStore>,
    feed: Arc<dyn ChangeFeed>,
    every: Duration,
) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "Starting fine refresh background job");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // first tick completes immediately, so fines are fresh right after start-up
        loop {
            interval.tick().await;

            match refresh_fines(store.as_ref(), feed.as_ref(), Utc::now()).await {
                Ok(summary) if summary.updated > 0 => {
                    info!("Refreshed fines on {} overdue loan(s)", summary.updated)
                }
                Ok(_) => {}
                Err(e) => error!("Failed to refresh overdue fines: {:?}", e),
            }
        }
    })
}
