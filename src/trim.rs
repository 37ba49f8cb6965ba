//! Trim rules: how one selection turns the current plan into the next.
//!
//! The boat flies at most one headsail and one downwind sail at a time,
//! with a single documented exception: the jib can double as a staysail
//! while a reaching spi flies. That `(JIB, REACHING_SPI)` pair is the
//! only way both slots are occupied at once, and staysail mode is only
//! reachable through it. Every rule here preserves that invariant, so
//! an illegal combination is unrepresentable by construction rather
//! than rejected at save time.

use crate::model::{DownwindSail, Headsail, SailPlan, Selection};

/// Applies one selection to a plan, producing the next plan.
///
/// Pure: the input plan is never mutated. Selections that would violate
/// the staysail invariant are ignored, not errors — the form simply
/// doesn't move.
pub fn apply(plan: &SailPlan, selection: Selection) -> SailPlan {
    let mut next = *plan;
    match selection {
        Selection::Main { state } => {
            // The main is independent: reefing never touches the foresails.
            next.main = state;
        }

        Selection::Headsail { sail } => {
            if sail == Headsail::None || sail == plan.headsail {
                // Deselect. The downwind sail keeps flying on its own.
                next.headsail = Headsail::None;
                next.staysail = false;
            } else if sail == Headsail::Jib && plan.downwind == DownwindSail::ReachingSpi {
                // The one legal pairing. Staysail mode is the user's call,
                // toggled separately.
                next.headsail = Headsail::Jib;
            } else {
                next.headsail = sail;
                next.staysail = false;
                if plan.downwind != DownwindSail::None {
                    next.downwind = DownwindSail::None;
                }
            }
        }

        Selection::Downwind { sail } => {
            if sail == DownwindSail::None || sail == plan.downwind {
                next.downwind = DownwindSail::None;
                next.staysail = false;
            } else if sail == DownwindSail::ReachingSpi {
                next.downwind = DownwindSail::ReachingSpi;
                if plan.headsail != Headsail::Jib && plan.headsail != Headsail::None {
                    next.headsail = Headsail::None;
                    next.staysail = false;
                }
            } else {
                // Biggee and Whomper fly alone.
                next.downwind = sail;
                next.headsail = Headsail::None;
                next.staysail = false;
            }
        }

        Selection::Staysail { on } => {
            if !on {
                next.staysail = false;
            } else if plan.headsail == Headsail::Jib && plan.downwind == DownwindSail::ReachingSpi
            {
                next.staysail = true;
            }
            // Enabling outside the pair is ignored.
        }

        Selection::AllDown => {
            next = SailPlan::default();
        }
    }
    next
}
