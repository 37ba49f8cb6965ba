//! The sail plan: an immutable snapshot of what is flying.

use serde::{Deserialize, Serialize};

use super::{DownwindSail, Headsail, MainSail};

/// One complete sail configuration.
///
/// Equality is field-wise over all four slots; this is the comparison
/// that decides whether a draft has unsaved changes. Comments and
/// timestamps live on [`super::LogEntry`], not here — a note belongs to
/// one persisted record and is never carried between configurations.
///
/// Invariant: `staysail` is only true while the jib flies inside a
/// reaching spi. Every transition in [`crate::trim`] maintains it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SailPlan {
    pub main: MainSail,
    pub headsail: Headsail,
    pub downwind: DownwindSail,
    /// Jib sheeted inside a flying reaching spi.
    pub staysail: bool,
}

impl SailPlan {
    /// Whether this is the rest state: main down, nothing else flying.
    pub fn is_all_down(self) -> bool {
        self == Self::default()
    }
}
