//! Durable persistence for sail plan records.
//!
//! The core talks to the store through [`PlanStore`]: an append-and-query
//! log keyed by time. Records are immutable once written; an update is a
//! new record, and the most recent one wins. The production
//! implementation is [`InfluxStore`], speaking the InfluxDB 2.x HTTP API.

mod influx;

use jiff::{SignedDuration, Timestamp};

use crate::model::LogEntry;

pub use influx::InfluxStore;

/// How far back to look for the current configuration.
pub const CURRENT_LOOKBACK: SignedDuration = SignedDuration::from_hours(24 * 30);

/// How far back the history listing reaches.
pub const HISTORY_LOOKBACK: SignedDuration = SignedDuration::from_hours(24 * 7);

/// Half-width of the deletion window around a record's timestamp.
///
/// The store may not support exact-key deletion, and stored instants are
/// rounded to whole seconds; a symmetric window absorbs both without
/// ever reaching a neighboring record.
pub const DELETE_WINDOW: SignedDuration = SignedDuration::from_millis(500);

/// Errors from talking to the store.
///
/// Absence of a record is not an error: queries return `Ok(None)` or an
/// empty list, and the caller maps that to the default configuration.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached at all.
    #[error("store unreachable: {0}")]
    Unavailable(String),

    /// The store answered with a non-success status.
    #[error("store rejected the request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The store answered, but the response could not be decoded.
    #[error("malformed store response: {0}")]
    Decode(String),
}

pub type Result<T> = core::result::Result<T, StoreError>;

/// The append-and-query log the reconciliation core writes through.
pub trait PlanStore {
    /// The most recent record within the lookback window, if any.
    fn latest(&self, lookback: SignedDuration) -> Result<Option<LogEntry>>;

    /// Records within the lookback window, most recent first, at most `limit`.
    fn recent(&self, lookback: SignedDuration, limit: usize) -> Result<Vec<LogEntry>>;

    /// Appends one immutable record.
    fn write(&self, entry: &LogEntry) -> Result<()>;

    /// Removes every record whose timestamp lies in `[start, stop)`.
    fn delete_range(&self, start: Timestamp, stop: Timestamp) -> Result<()>;
}
