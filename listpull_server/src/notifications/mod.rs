//! Staff notifications on Discord.
//!
//! * [`digest`] builds and posts the once-a-day summary of outstanding orders.
//! * [`sweep`] posts one alert per order that has stalled, and remembers that it did.
//! * [`scheduler`] decides when each of those runs.
//!
//! Every job is a no-op when no webhook is configured.
pub mod digest;
pub mod scheduler;
pub mod sweep;

use chrono::{DateTime, Utc};

pub use digest::{build_digest_embed, run_digest};
pub use scheduler::{start_scheduler, Scheduler, TickReport, SWEEP_INTERVAL_MINUTES, TICK_INTERVAL};
pub use sweep::{run_stale_sweep, stale_order_alert, stale_pickup_alert, SweepSummary};

/// A short human reading of how long something has been waiting, e.g. `2d 3h`, `5h` or `40m`.
pub fn format_waiting(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let waited = now.signed_duration_since(since);
    let days = waited.num_days();
    let hours = waited.num_hours() % 24;
    match (days, hours) {
        (d, h) if d > 0 => format!("{d}d {h}h"),
        (_, h) if h > 0 => format!("{h}h"),
        _ => format!("{}m", waited.num_minutes().max(0)),
    }
}
