//! Log entries: persisted sail plan records.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::SailPlan;

/// One persisted record: a sail plan, its note, and when it took effect.
///
/// The timestamp is either the moment the entry was saved or a
/// user-chosen past instant (backdating). Stored at second precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub plan: SailPlan,
    /// Freeform note: conditions, reason for the change. May be empty.
    pub comment: String,
    pub at: Timestamp,
}

impl LogEntry {
    /// Builds an entry from a plan, truncating the instant to whole seconds
    /// to match the stored precision.
    pub fn new(plan: SailPlan, comment: impl Into<String>, at: Timestamp) -> Self {
        let at = Timestamp::from_second(at.as_second()).unwrap_or(at);
        Self {
            plan,
            comment: comment.into(),
            at,
        }
    }
}
