//! Boat position and timezone, from Signal K.
//!
//! The boat moves, so the display timezone follows the GPS: fetch the
//! position from Signal K, look up the IANA zone at those coordinates,
//! and fall back to UTC whenever any step fails. The resolved zone is
//! cached on disk for ten minutes to bound outbound lookups — one slow
//! or dead Signal K must not stall every command.

use std::time::Duration;
use std::{fs, path::PathBuf};

use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use tzf_rs::DefaultFinder;

/// How long a resolved timezone stays fresh.
const TZ_TTL: SignedDuration = SignedDuration::from_secs(600);

/// Hard ceiling on the position request.
const POSITION_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for the Signal K position endpoint.
pub struct PositionGateway {
    agent: ureq::Agent,
    url: String,
}

impl PositionGateway {
    pub fn new(url: &str) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(POSITION_TIMEOUT).build();
        Self {
            agent,
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// The boat's current position as `(latitude, longitude)`.
    ///
    /// Timeout, transport failure, non-200, and malformed bodies all
    /// yield `None` — position is best-effort by design.
    pub fn current_position(&self) -> Option<(f64, f64)> {
        let response = self
            .agent
            .get(&format!(
                "{}/signalk/v1/api/vessels/self/navigation/position",
                self.url
            ))
            .call()
            .ok()?;
        let body: PositionResponse = response.into_json().ok()?;
        let value = body.value?;
        Some((value.latitude?, value.longitude?))
    }
}

/// Signal K position payload (only the fields we read).
#[derive(Debug, Deserialize)]
struct PositionResponse {
    value: Option<PositionValue>,
}

#[derive(Debug, Deserialize)]
struct PositionValue {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// On-disk record of the last resolved zone.
#[derive(Debug, Serialize, Deserialize)]
struct CachedZone {
    name: String,
    fetched_at: Timestamp,
}

/// Resolves the boat's timezone, with a file-backed cache.
pub struct TimezoneResolver {
    gateway: PositionGateway,
    cache_path: PathBuf,
}

impl TimezoneResolver {
    pub fn new(gateway: PositionGateway, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            gateway,
            cache_path: state_dir.into().join("timezone.json"),
        }
    }

    /// The timezone at the boat's position, or UTC when unknown.
    pub fn boat_timezone(&self) -> TimeZone {
        if let Some(name) = self.cached_name(Timestamp::now()) {
            if let Ok(tz) = TimeZone::get(&name) {
                return tz;
            }
        }

        let Some((lat, lon)) = self.gateway.current_position() else {
            return TimeZone::UTC;
        };
        let name = lookup_zone_name(lat, lon);
        if name.is_empty() {
            return TimeZone::UTC;
        }
        let Ok(tz) = TimeZone::get(&name) else {
            return TimeZone::UTC;
        };
        self.remember(&name);
        tz
    }

    /// The cached zone name, if fetched within the TTL. Corrupt or stale
    /// cache files are treated as absent.
    fn cached_name(&self, now: Timestamp) -> Option<String> {
        let json = fs::read_to_string(&self.cache_path).ok()?;
        let cached: CachedZone = serde_json::from_str(&json).ok()?;
        let age = now.duration_since(cached.fetched_at);
        if age >= SignedDuration::ZERO && age < TZ_TTL {
            Some(cached.name)
        } else {
            None
        }
    }

    /// Best-effort cache write; a failure just means a lookup next time.
    fn remember(&self, name: &str) {
        let cached = CachedZone {
            name: name.to_string(),
            fetched_at: Timestamp::now(),
        };
        if let Ok(json) = serde_json::to_string(&cached) {
            let _ = fs::write(&self.cache_path, json);
        }
    }
}

/// Geospatial lookup of the IANA zone name at a coordinate.
fn lookup_zone_name(latitude: f64, longitude: f64) -> String {
    // The finder indexes by (longitude, latitude).
    DefaultFinder::new()
        .get_tz_name(longitude, latitude)
        .to_string()
}
