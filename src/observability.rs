use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

// ── Scheduling metrics ──────────────────────────────────────────

/// Counter: sessions placed into a room.
pub const PLACEMENTS_TOTAL: &str = "roombook_placements_total";

/// Counter: placement checks that failed. Labels: kind.
pub const PLACEMENT_REJECTIONS_TOTAL: &str = "roombook_placement_rejections_total";

/// Counter: seats booked.
pub const BOOKINGS_TOTAL: &str = "roombook_bookings_total";

/// Counter: bookings refused (duplicate member or full session).
pub const BOOKING_REJECTIONS_TOTAL: &str = "roombook_booking_rejections_total";

/// Counter: session patch outcomes. Labels: outcome.
pub const SESSION_UPDATES_TOTAL: &str = "roombook_session_updates_total";

/// Counter: room patch outcomes. Labels: outcome.
pub const ROOM_UPDATES_TOTAL: &str = "roombook_room_updates_total";

/// Counter: sessions dropped out of a room by an update.
pub const SESSIONS_DETACHED_TOTAL: &str = "roombook_sessions_detached_total";

// ── Journal metrics ─────────────────────────────────────────────

/// Counter: journal compactions run.
pub const JOURNAL_COMPACTIONS_TOTAL: &str = "roombook_journal_compactions_total";

/// Histogram: journal compaction duration in seconds.
pub const JOURNAL_COMPACTION_SECONDS: &str = "roombook_journal_compaction_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
