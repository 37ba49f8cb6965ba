//! Selections: the discrete edits a user can make to the draft.

use serde::{Deserialize, Serialize};

use super::{DownwindSail, Headsail, MainSail};

/// One user edit against the working draft.
///
/// Each variant maps to one control on the logging form. Headsail and
/// downwind selections carry toggle semantics: picking the sail that is
/// already flying deselects it. How a selection ripples into the other
/// slots is decided by [`crate::trim::apply`], never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Selection {
    /// Set the main sail state.
    Main { state: MainSail },

    /// Toggle a headsail.
    Headsail { sail: Headsail },

    /// Toggle a downwind sail.
    Downwind { sail: DownwindSail },

    /// Switch staysail mode. Only honored while the jib flies inside a
    /// reaching spi; ignored otherwise.
    Staysail { on: bool },

    /// Drop everything: reset to the all-down plan.
    AllDown,
}
