//! InfluxDB 2.x adapter for [`PlanStore`].
//!
//! Records live in one measurement (`sail_config`), tagged with the
//! vessel name, one field per sail slot plus the comment. Writes use the
//! line protocol at second precision; queries are Flux scripts answered
//! in annotated CSV; deletes go through the delete API with a predicate.
//!
//! All mapping between the store's native record shape and [`LogEntry`]
//! happens here. A record the adapter cannot account for — missing
//! column, sail token outside the vocabulary — is a decode error, never
//! a silently defaulted value.

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};

use crate::config::InfluxConfig;
use crate::model::{DownwindSail, Headsail, LogEntry, MainSail, SailPlan};

use super::{PlanStore, Result, StoreError};

const MEASUREMENT: &str = "sail_config";

/// Client for one InfluxDB org/bucket, scoped to one vessel tag.
pub struct InfluxStore {
    agent: ureq::Agent,
    url: String,
    token: String,
    org: String,
    bucket: String,
    vessel: String,
}

impl InfluxStore {
    pub fn new(influx: &InfluxConfig, vessel: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(5))
            .build();
        Self {
            agent,
            url: influx.url.trim_end_matches('/').to_string(),
            token: influx.token.clone(),
            org: influx.org.clone(),
            bucket: influx.bucket.clone(),
            vessel: vessel.to_string(),
        }
    }

    fn auth(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Renders the Flux query for the most recent records in the window.
    fn flux_recent(&self, lookback: SignedDuration, limit: usize) -> String {
        format!(
            "from(bucket: \"{bucket}\")\n\
             \x20 |> range(start: -{secs}s)\n\
             \x20 |> filter(fn: (r) => r[\"_measurement\"] == \"{MEASUREMENT}\")\n\
             \x20 |> filter(fn: (r) => r[\"vessel\"] == \"{vessel}\")\n\
             \x20 |> pivot(rowKey: [\"_time\"], columnKey: [\"_field\"], valueColumn: \"_value\")\n\
             \x20 |> sort(columns: [\"_time\"], desc: true)\n\
             \x20 |> limit(n: {limit})",
            bucket = escape_flux_string(&self.bucket),
            secs = lookback.as_secs(),
            vessel = escape_flux_string(&self.vessel),
        )
    }

    fn run_query(&self, flux: &str) -> Result<Vec<LogEntry>> {
        let response = self
            .agent
            .post(&format!("{}/api/v2/query", self.url))
            .query("org", &self.org)
            .set("Authorization", &self.auth())
            .set("Content-Type", "application/vnd.flux")
            .set("Accept", "application/csv")
            .send_string(flux)
            .map_err(request_error)?;
        let body = response
            .into_string()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        decode_entries(&body)
    }
}

impl PlanStore for InfluxStore {
    fn latest(&self, lookback: SignedDuration) -> Result<Option<LogEntry>> {
        let entries = self.run_query(&self.flux_recent(lookback, 1))?;
        Ok(entries.into_iter().next())
    }

    fn recent(&self, lookback: SignedDuration, limit: usize) -> Result<Vec<LogEntry>> {
        self.run_query(&self.flux_recent(lookback, limit))
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let line = encode_line(&self.vessel, entry);
        self.agent
            .post(&format!("{}/api/v2/write", self.url))
            .query("org", &self.org)
            .query("bucket", &self.bucket)
            .query("precision", "s")
            .set("Authorization", &self.auth())
            .send_string(&line)
            .map_err(request_error)?;
        Ok(())
    }

    fn delete_range(&self, start: Timestamp, stop: Timestamp) -> Result<()> {
        let body = serde_json::json!({
            "start": start.to_string(),
            "stop": stop.to_string(),
            "predicate": format!(
                "_measurement=\"{MEASUREMENT}\" AND vessel=\"{}\"",
                self.vessel
            ),
        });
        self.agent
            .post(&format!("{}/api/v2/delete", self.url))
            .query("org", &self.org)
            .query("bucket", &self.bucket)
            .set("Authorization", &self.auth())
            .send_json(body)
            .map_err(request_error)?;
        Ok(())
    }
}

fn request_error(err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(status, response) => StoreError::Rejected {
            status,
            body: response.into_string().unwrap_or_default(),
        },
        other => StoreError::Unavailable(other.to_string()),
    }
}

// ── Line protocol ──

/// Encodes one record as an InfluxDB line-protocol line, second precision.
fn encode_line(vessel: &str, entry: &LogEntry) -> String {
    let plan = entry.plan;
    format!(
        "{MEASUREMENT},vessel={} main=\"{}\",headsail=\"{}\",downwind=\"{}\",staysail_mode={},comment=\"{}\" {}",
        escape_tag(vessel),
        plan.main.as_str(),
        plan.headsail.as_str(),
        plan.downwind.as_str(),
        plan.staysail,
        escape_field_string(&entry.comment),
        entry.at.as_second(),
    )
}

/// Tag values escape commas, spaces, and equals signs.
fn escape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// String field values escape backslashes and double quotes.
fn escape_field_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Flux string literals escape backslashes and double quotes.
fn escape_flux_string(value: &str) -> String {
    escape_field_string(value)
}

// ── Annotated CSV ──

/// Decodes a Flux annotated-CSV response into log entries.
///
/// Annotation rows (`#group`, `#datatype`, `#default`) are skipped; the
/// first plain row of each table is its header; a blank line ends the
/// table. An empty response decodes to no entries.
fn decode_entries(body: &str) -> Result<Vec<LogEntry>> {
    let mut entries = Vec::new();
    let mut header: Option<Vec<String>> = None;
    for record in csv_records(body) {
        if record.len() == 1 && record[0].is_empty() {
            // Blank line: table boundary.
            header = None;
            continue;
        }
        if record[0].starts_with('#') {
            continue;
        }
        match &header {
            None => header = Some(record),
            Some(columns) => entries.push(entry_from_row(columns, &record)?),
        }
    }
    Ok(entries)
}

fn entry_from_row(columns: &[String], row: &[String]) -> Result<LogEntry> {
    let at = column(columns, row, "_time")?
        .parse::<Timestamp>()
        .map_err(|e| StoreError::Decode(format!("bad _time: {e}")))?;

    let main_token = column(columns, row, "main")?;
    let main = MainSail::from_token(main_token)
        .ok_or_else(|| StoreError::Decode(format!("unknown main sail token `{main_token}`")))?;

    let headsail_token = column(columns, row, "headsail")?;
    let headsail = Headsail::from_token(headsail_token)
        .ok_or_else(|| StoreError::Decode(format!("unknown headsail token `{headsail_token}`")))?;

    let downwind_token = column(columns, row, "downwind")?;
    let downwind = DownwindSail::from_token(downwind_token)
        .ok_or_else(|| StoreError::Decode(format!("unknown downwind token `{downwind_token}`")))?;

    let staysail = match column(columns, row, "staysail_mode")? {
        "true" => true,
        "false" => false,
        other => {
            return Err(StoreError::Decode(format!(
                "staysail_mode is not a boolean: `{other}`"
            )));
        }
    };

    // Records predating the comment field have no comment column.
    let comment = optional_column(columns, row, "comment").unwrap_or_default();

    Ok(LogEntry {
        plan: SailPlan {
            main,
            headsail,
            downwind,
            staysail,
        },
        comment: comment.to_string(),
        at,
    })
}

fn column<'a>(columns: &[String], row: &'a [String], name: &str) -> Result<&'a str> {
    optional_column(columns, row, name)
        .ok_or_else(|| StoreError::Decode(format!("missing column `{name}`")))
}

fn optional_column<'a>(columns: &[String], row: &'a [String], name: &str) -> Option<&'a str> {
    let index = columns.iter().position(|c| c == name)?;
    row.get(index).map(String::as_str)
}

/// Splits CSV text into records, honoring RFC 4180 quoting: quoted
/// fields may contain commas, newlines, and doubled quotes.
fn csv_records(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}
