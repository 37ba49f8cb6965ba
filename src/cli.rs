//! CLI interface for sailplan.
//!
//! One subcommand per discrete action on the logging form; each
//! invocation is one interaction cycle: pick up the committed state
//! (and the saved draft, if any), apply the action, print the result.
//! Non-interactive throughout: arguments in, rows out.
//!
//! The draft lives in the slate between invocations, so an editing
//! sequence reads naturally:
//!
//! ```text
//! sailplan set main r2
//! sailplan set headsail storm
//! sailplan commit --note "reefed for gust"
//! ```

mod format;

use std::cmp;

use clap::{Parser, Subcommand, ValueEnum};
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp, civil};

use crate::config::Config;
use crate::model::{DownwindSail, Headsail, LogEntry, MainSail, Selection};
use crate::position::{PositionGateway, TimezoneResolver};
use crate::session::Session;
use crate::slate::Slate;
use crate::store::{DELETE_WINDOW, HISTORY_LOOKBACK, InfluxStore, PlanStore};

use format::{local_datetime, local_time, summary};

/// Sailplan — log what the boat is flying.
#[derive(Debug, Parser)]
#[command(name = "sailplan")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current configuration, the draft, and the boat clock.
    Status,

    /// Edit one slot of the draft.
    ///
    /// Headsail and downwind selections toggle: picking the sail that is
    /// already flying takes it down. Incompatible sails in the other
    /// slot come down automatically.
    Set {
        #[command(subcommand)]
        slot: SetSlot,
    },

    /// Drop everything: reset the draft to all sails down.
    Down,

    /// Save the draft as a new log entry.
    Commit {
        /// Note for this entry: conditions, reason for the change.
        #[arg(long)]
        note: Option<String>,

        /// Backdate the entry. RFC 3339, or `"YYYY-MM-DD HH:MM"` in the
        /// boat's timezone. Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// List log entries from the last seven days, most recent first.
    History {
        /// Maximum number of entries to show.
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Emit the entries as JSON instead of rows.
        #[arg(long)]
        json: bool,
    },

    /// Delete the log entry recorded at the given instant.
    ///
    /// Matches within half a second of the given time. Without `--yes`
    /// the matching entry is only shown, nothing is deleted.
    Delete {
        /// When the entry was recorded. Same formats as `commit --at`.
        when: String,

        /// Actually delete.
        #[arg(long)]
        yes: bool,
    },

    /// Discard unsaved draft edits and resync from the store.
    Revert,
}

#[derive(Debug, Subcommand)]
pub enum SetSlot {
    /// Set the main sail state.
    Main { state: MainArg },

    /// Toggle a headsail.
    Headsail { sail: HeadsailArg },

    /// Toggle a downwind sail.
    Downwind { sail: DownwindArg },

    /// Staysail mode: the jib sheeted inside the reaching spi.
    /// Only honored while that pair is flying.
    Staysail { mode: StaysailArg },
}

impl SetSlot {
    fn to_selection(&self) -> Selection {
        match self {
            Self::Main { state } => Selection::Main {
                state: state.to_domain(),
            },
            Self::Headsail { sail } => Selection::Headsail {
                sail: sail.to_domain(),
            },
            Self::Downwind { sail } => Selection::Downwind {
                sail: sail.to_domain(),
            },
            Self::Staysail { mode } => Selection::Staysail {
                on: matches!(mode, StaysailArg::On),
            },
        }
    }
}

/// CLI-facing main sail state, mapped to the domain `MainSail`.
#[derive(Debug, Clone, ValueEnum)]
pub enum MainArg {
    Down,
    Full,
    R1,
    R2,
    R3,
    R4,
}

impl MainArg {
    fn to_domain(&self) -> MainSail {
        match self {
            Self::Down => MainSail::Down,
            Self::Full => MainSail::Full,
            Self::R1 => MainSail::R1,
            Self::R2 => MainSail::R2,
            Self::R3 => MainSail::R3,
            Self::R4 => MainSail::R4,
        }
    }
}

/// CLI-facing headsail, mapped to the domain `Headsail`.
#[derive(Debug, Clone, ValueEnum)]
pub enum HeadsailArg {
    /// No headsail.
    None,
    Jib,
    J1,
    Storm,
}

impl HeadsailArg {
    fn to_domain(&self) -> Headsail {
        match self {
            Self::None => Headsail::None,
            Self::Jib => Headsail::Jib,
            Self::J1 => Headsail::J1,
            Self::Storm => Headsail::Storm,
        }
    }
}

/// CLI-facing downwind sail, mapped to the domain `DownwindSail`.
#[derive(Debug, Clone, ValueEnum)]
pub enum DownwindArg {
    /// No downwind sail.
    None,
    Biggee,
    ReachingSpi,
    Whomper,
}

impl DownwindArg {
    fn to_domain(&self) -> DownwindSail {
        match self {
            Self::None => DownwindSail::None,
            Self::Biggee => DownwindSail::Biggee,
            Self::ReachingSpi => DownwindSail::ReachingSpi,
            Self::Whomper => DownwindSail::Whomper,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum StaysailArg {
    On,
    Off,
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();
    let store = InfluxStore::new(&config.influx, &config.boat.vessel);
    let slate = Slate::new(&config.state_dir);

    match cli.command {
        Command::Status => cmd_status(config, store, &slate),
        Command::Set { slot } => cmd_apply(config, store, &slate, slot.to_selection()),
        Command::Down => cmd_apply(config, store, &slate, Selection::AllDown),
        Command::Commit { note, at } => {
            cmd_commit(config, store, &slate, note.as_deref(), at.as_deref())
        }
        Command::History { limit, json } => cmd_history(config, &store, limit, json),
        Command::Delete { when, yes } => cmd_delete(config, store, &when, yes),
        Command::Revert => cmd_revert(config, store, &slate),
    }
}

/// The boat's timezone, resolved fresh or from the short-lived cache.
fn boat_tz(config: &Config) -> TimeZone {
    TimezoneResolver::new(
        PositionGateway::new(&config.signalk_url),
        &config.state_dir,
    )
    .boat_timezone()
}

/// Opens a session over the store, seating any saved draft.
fn open_session(store: InfluxStore, slate: &Slate) -> Result<Session<InfluxStore>, String> {
    let saved = slate
        .load()
        .map_err(|e| format!("failed to read the draft slate: {e}"))?;
    Ok(Session::open(store, saved))
}

/// Persists the session's draft state: saved while pending, cleared when
/// clean, so an absent slate always means "nothing unsaved".
fn store_slate(slate: &Slate, session: &Session<InfluxStore>) -> Result<(), String> {
    if session.pending() {
        slate
            .save(&session.draft())
            .map_err(|e| format!("failed to save the draft slate: {e}"))
    } else {
        slate
            .clear()
            .map_err(|e| format!("failed to clear the draft slate: {e}"))
    }
}

fn cmd_status(config: &Config, store: InfluxStore, slate: &Slate) -> Result<(), String> {
    let session = open_session(store, slate)?;
    store_slate(slate, &session)?;

    let tz = boat_tz(config);
    println!(
        "{}  {}",
        config.boat.name.to_uppercase(),
        local_time(Timestamp::now(), &tz)
    );
    println!("Current: {}", summary(&session.committed(), &config.boat));
    if session.pending() {
        println!("Draft:   {}", summary(&session.draft(), &config.boat));
        println!("Unsaved changes — `sailplan commit` to log them.");
    }
    Ok(())
}

fn cmd_apply(
    config: &Config,
    store: InfluxStore,
    slate: &Slate,
    selection: Selection,
) -> Result<(), String> {
    let mut session = open_session(store, slate)?;
    session.apply(selection);
    store_slate(slate, &session)?;

    println!("{}", summary(&session.draft(), &config.boat));
    if session.pending() {
        println!("Unsaved changes — `sailplan commit` to log them.");
    }
    Ok(())
}

fn cmd_commit(
    config: &Config,
    store: InfluxStore,
    slate: &Slate,
    note: Option<&str>,
    at: Option<&str>,
) -> Result<(), String> {
    let tz = boat_tz(config);
    let at = at.map(|s| parse_when(s, &tz)).transpose()?;

    let mut session = open_session(store, slate)?;
    let entry = session
        .commit(note.unwrap_or_default(), at)
        .map_err(|e| format!("failed to save: {e}"))?;
    slate
        .clear()
        .map_err(|e| format!("failed to clear the draft slate: {e}"))?;

    println!(
        "Logged: {} at {}",
        summary(&entry.plan, &config.boat),
        local_datetime(entry.at, &tz)
    );
    if !entry.comment.is_empty() {
        println!("Note: \"{}\"", entry.comment);
    }
    Ok(())
}

fn cmd_history(
    config: &Config,
    store: &InfluxStore,
    limit: usize,
    json: bool,
) -> Result<(), String> {
    let entries = store
        .recent(HISTORY_LOOKBACK, limit)
        .map_err(|e| format!("failed to read history: {e}"))?;

    if json {
        let out = serde_json::to_string_pretty(&entries)
            .map_err(|e| format!("failed to serialize history: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("No recent entries");
        return Ok(());
    }
    let tz = boat_tz(config);
    for entry in &entries {
        println!("{}", history_row(entry, config, &tz));
    }
    Ok(())
}

fn history_row(entry: &LogEntry, config: &Config, tz: &TimeZone) -> String {
    let mut row = format!(
        "{}  {}",
        local_datetime(entry.at, tz),
        summary(&entry.plan, &config.boat)
    );
    if !entry.comment.is_empty() {
        row.push_str(&format!("  \"{}\"", entry.comment));
    }
    row
}

fn cmd_delete(config: &Config, store: InfluxStore, when: &str, yes: bool) -> Result<(), String> {
    let tz = boat_tz(config);
    let at = parse_when(when, &tz)?;
    let start = at - DELETE_WINDOW;
    let stop = at + DELETE_WINDOW;

    // Find what the window would take, so the user sees it first.
    let lookback = cmp::max(
        Timestamp::now().duration_since(at) + SignedDuration::from_hours(1),
        HISTORY_LOOKBACK,
    );
    let matches: Vec<LogEntry> = store
        .recent(lookback, 500)
        .map_err(|e| format!("failed to read the log: {e}"))?
        .into_iter()
        .filter(|e| e.at >= start && e.at < stop)
        .collect();

    if matches.is_empty() {
        println!(
            "No entry within half a second of {}.",
            local_datetime(at, &tz)
        );
        return Ok(());
    }

    if !yes {
        for entry in &matches {
            println!("{}", history_row(entry, config, &tz));
        }
        println!("Re-run with --yes to delete.");
        return Ok(());
    }

    let mut session = Session::open(store, None);
    session
        .discard_entry(at)
        .map_err(|e| format!("failed to delete: {e}"))?;
    for entry in &matches {
        println!("Deleted: {}", history_row(entry, config, &tz));
    }
    Ok(())
}

fn cmd_revert(config: &Config, store: InfluxStore, slate: &Slate) -> Result<(), String> {
    let mut session = open_session(store, slate)?;
    session.discard_draft();
    slate
        .clear()
        .map_err(|e| format!("failed to clear the draft slate: {e}"))?;

    println!(
        "Draft discarded. Current: {}",
        summary(&session.committed(), &config.boat)
    );
    Ok(())
}

/// Parses a user-supplied instant: RFC 3339, or a civil date-time
/// (`YYYY-MM-DD HH:MM[:SS]`) interpreted in the boat's timezone.
fn parse_when(input: &str, tz: &TimeZone) -> Result<Timestamp, String> {
    if let Ok(at) = input.parse::<Timestamp>() {
        return Ok(at);
    }
    let civil = civil::DateTime::strptime("%Y-%m-%d %H:%M:%S", input)
        .or_else(|_| civil::DateTime::strptime("%Y-%m-%d %H:%M", input))
        .map_err(|_| {
            format!(
                "could not parse `{input}` — use RFC 3339 or \"YYYY-MM-DD HH:MM\" (boat time)"
            )
        })?;
    let zoned = civil
        .to_zoned(tz.clone())
        .map_err(|e| format!("could not place `{input}` in the boat timezone: {e}"))?;
    Ok(zoned.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_when_accepts_rfc3339() {
        let at = parse_when("2024-01-15T14:32:00Z", &TimeZone::UTC).unwrap();
        assert_eq!(at, "2024-01-15T14:32:00Z".parse::<Timestamp>().unwrap());
    }

    #[test]
    fn parse_when_reads_civil_time_in_the_boat_zone() {
        let tz = TimeZone::get("America/New_York").unwrap();
        let at = parse_when("2024-01-15 14:32", &tz).unwrap();
        assert_eq!(at, "2024-01-15T19:32:00Z".parse::<Timestamp>().unwrap());

        let with_seconds = parse_when("2024-01-15 14:32:10", &tz).unwrap();
        assert_eq!(
            with_seconds,
            "2024-01-15T19:32:10Z".parse::<Timestamp>().unwrap()
        );
    }

    #[test]
    fn parse_when_rejects_garbage() {
        let err = parse_when("yesterdayish", &TimeZone::UTC).unwrap_err();
        assert!(err.contains("could not parse"));
    }

    #[test]
    fn selection_mapping_covers_the_alphabet() {
        assert_eq!(
            SetSlot::Main { state: MainArg::R3 }.to_selection(),
            Selection::Main {
                state: MainSail::R3
            }
        );
        assert_eq!(
            SetSlot::Headsail {
                sail: HeadsailArg::Jib
            }
            .to_selection(),
            Selection::Headsail {
                sail: Headsail::Jib
            }
        );
        assert_eq!(
            SetSlot::Downwind {
                sail: DownwindArg::ReachingSpi
            }
            .to_selection(),
            Selection::Downwind {
                sail: DownwindSail::ReachingSpi
            }
        );
        assert_eq!(
            SetSlot::Staysail {
                mode: StaysailArg::On
            }
            .to_selection(),
            Selection::Staysail { on: true }
        );
    }
}
