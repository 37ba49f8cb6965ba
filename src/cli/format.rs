//! Output formatting for CLI display.

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::config::BoatConfig;
use crate::model::{DownwindSail, Headsail, SailPlan};

/// Format a sail plan as a readable one-line summary.
pub(super) fn summary(plan: &SailPlan, boat: &BoatConfig) -> String {
    if plan.is_all_down() {
        return "All sails down".to_string();
    }

    let mut parts = vec![format!("Main: {}", plan.main.as_str())];
    if plan.headsail != Headsail::None {
        let mut name = boat.label(plan.headsail.as_str());
        if plan.staysail {
            name.push_str(" (S)");
        }
        parts.push(name);
    }
    if plan.downwind != DownwindSail::None {
        parts.push(boat.label(plan.downwind.as_str()));
    }
    parts.join(" + ")
}

/// Clock-only display in the boat's timezone, like `14:32`.
pub(super) fn local_time(at: Timestamp, tz: &TimeZone) -> String {
    at.to_zoned(tz.clone()).strftime("%H:%M").to_string()
}

/// Date and time in the boat's timezone, like `01/15 14:32 EST`.
pub(super) fn local_datetime(at: Timestamp, tz: &TimeZone) -> String {
    at.to_zoned(tz.clone()).strftime("%m/%d %H:%M %Z").to_string()
}
