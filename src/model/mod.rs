//! Core data model for sailplan.
//!
//! These types represent the conceptual architecture: the sail
//! vocabulary, the sail plan snapshot, the edits a user can make to it,
//! and the records the store keeps.

mod entry;
mod plan;
mod sail;
mod selection;

pub use entry::LogEntry;
pub use plan::SailPlan;
pub use sail::{DownwindSail, Headsail, MainSail};
pub use selection::Selection;
