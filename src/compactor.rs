use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::engine::InMemoryStore;
use crate::observability::{JOURNAL_COMPACTIONS_TOTAL, JOURNAL_COMPACTION_SECONDS};

/// Compact the journal if at least `threshold` appends piled up.
/// Returns whether a compaction ran.
pub fn compact_if_due(store: &InMemoryStore, threshold: u64) -> bool {
    let appends = store.appends_since_compact();
    if appends < threshold {
        debug!("journal has {appends} appends, below threshold {threshold}");
        return false;
    }
    let started = Instant::now();
    match store.compact() {
        Ok(()) => {
            metrics::counter!(JOURNAL_COMPACTIONS_TOTAL).increment(1);
            metrics::histogram!(JOURNAL_COMPACTION_SECONDS).record(started.elapsed().as_secs_f64());
            info!("journal compacted after {appends} appends");
            true
        }
        Err(e) => {
            warn!("journal compaction failed: {e}");
            false
        }
    }
}

/// Background task that periodically compacts the journal.
pub async fn run_compactor(store: Arc<InMemoryStore>, threshold: u64, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let store = store.clone();
        // Compaction fsyncs; keep it off the async workers.
        let job = tokio::task::spawn_blocking(move || compact_if_due(&store, threshold));
        if let Err(e) = job.await {
            warn!("compactor task failed: {e}");
        }
    }
}
