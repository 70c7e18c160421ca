//! TTL Cleanup Task
//!
//! Background sweep that drops expired in-memory entries nobody reads
//! again. Reads already discard expired entries lazily.
//!
//! The task only holds a weak handle, so it stops on its own once the
//! table's last owner is dropped.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::memory::MemoryTable;

/// Spawns a background task that periodically removes expired entries.
///
/// The task sleeps `cleanup_interval_secs` between sweeps (at least one
/// second). It runs until the returned handle is aborted or the table is
/// dropped.
///
/// # Example
/// ```ignore
/// let table = MemoryTable::with_capacity(1000);
/// let cleanup_handle = spawn_cleanup_task(table.clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(table: MemoryTable, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));
    let table = table.downgrade();

    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            "Starting TTL cleanup task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let Some(live) = table.upgrade() else {
                debug!("TTL cleanup: table dropped, stopping");
                break;
            };
            let removed = live.cleanup_expired().await;
            drop(live);

            if removed > 0 {
                info!(removed = removed, "TTL cleanup: removed expired entries");
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
