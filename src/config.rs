//! Sailplan configuration.
//!
//! Connection parameters come from the environment (the deployment's
//! concern); the boat's identity and display labels come from
//! `boat.toml` in the state directory. Required connection parameters
//! that are missing are fatal at startup — the core never runs half
//! configured.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;

/// Runtime configuration, resolved at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub influx: InfluxConfig,
    pub signalk_url: String,
    pub boat: BoatConfig,
    /// Home of the slate, the timezone cache, and `boat.toml`.
    pub state_dir: PathBuf,
}

/// InfluxDB connection parameters.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

/// The boat's identity and sail display labels.
#[derive(Debug, Clone)]
pub struct BoatConfig {
    /// Display name, shown in the status header.
    pub name: String,
    /// Tag value for this vessel's records in the store.
    pub vessel: String,
    display: BTreeMap<String, String>,
}

impl Default for BoatConfig {
    fn default() -> Self {
        Self {
            name: "Boat".to_string(),
            vessel: "boat".to_string(),
            display: BTreeMap::new(),
        }
    }
}

impl BoatConfig {
    /// Display label for a sail token: configured override, then the
    /// built-in label, then the token itself.
    pub fn label(&self, token: &str) -> String {
        if let Some(label) = self.display.get(token) {
            return label.clone();
        }
        default_label(token).unwrap_or(token).to_string()
    }
}

/// Built-in display labels for the sail vocabulary.
fn default_label(token: &str) -> Option<&'static str> {
    match token {
        "JIB" => Some("Jib"),
        "STORM" => Some("Storm"),
        "BIGGEE" => Some("Biggee"),
        "REACHING_SPI" => Some("Reaching Spi"),
        "WHOMPER" => Some("Whomper"),
        _ => None,
    }
}

impl Config {
    /// Load configuration from the environment and the boat file.
    /// Returns an error message if a required value is missing or invalid.
    pub fn load() -> Result<Self, String> {
        let state_dir = state_dir()?;
        let boat = load_boat(&state_dir.join("boat.toml"))?;

        let token = env::var("INFLUX_TOKEN").ok().filter(|t| !t.is_empty());
        let Some(token) = token else {
            return Err(
                "INFLUX_TOKEN is not set\n\
                 Set the InfluxDB connection in the environment:\n\n\
                 INFLUX_TOKEN=<api token> (required)\n\
                 INFLUX_URL, INFLUX_ORG, INFLUX_BUCKET (optional)"
                    .to_string(),
            );
        };

        Ok(Self {
            influx: InfluxConfig {
                url: env_or("INFLUX_URL", "http://localhost:8086"),
                token,
                org: env_or("INFLUX_ORG", "openplotter"),
                bucket: env_or("INFLUX_BUCKET", "default"),
            },
            signalk_url: env_or("SIGNALK_URL", "http://localhost:3000"),
            boat,
            state_dir,
        })
    }
}

/// The state directory: `$SAILPLAN_DIR` if set, else `~/.sailplan`.
fn state_dir() -> Result<PathBuf, String> {
    if let Ok(dir) = env::var("SAILPLAN_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|h| h.join(".sailplan"))
        .ok_or_else(|| "could not determine home directory".to_string())
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// On-disk shape of `boat.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BoatFile {
    boat: Option<BoatSection>,
    display: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BoatSection {
    name: Option<String>,
    vessel: Option<String>,
}

/// Loads the boat file. A missing file falls back to built-in defaults;
/// a present but invalid file is an error.
fn load_boat(path: &Path) -> Result<BoatConfig, String> {
    if !path.exists() {
        return Ok(BoatConfig::default());
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let file: BoatFile = toml::from_str(&contents)
        .map_err(|e| format!("invalid boat config at {}: {e}", path.display()))?;

    let section = file.boat.unwrap_or_default();
    let name = section.name.unwrap_or_else(|| "Boat".to_string());
    // The tag defaults to the lowercased boat name.
    let vessel = section.vessel.unwrap_or_else(|| name.to_lowercase());
    Ok(BoatConfig {
        name,
        vessel,
        display: file.display.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn write_boat(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("boat.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_boat_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let boat = load_boat(&dir.path().join("boat.toml")).unwrap();
        assert_eq!(boat.name, "Boat");
        assert_eq!(boat.vessel, "boat");
    }

    #[test]
    fn full_boat_file_parses() {
        let (_dir, path) = write_boat(
            "[boat]\n\
             name = \"Morticia\"\n\
             vessel = \"morticia\"\n\n\
             [display]\n\
             BIGGEE = \"Big Gee\"\n",
        );
        let boat = load_boat(&path).unwrap();
        assert_eq!(boat.name, "Morticia");
        assert_eq!(boat.vessel, "morticia");
        assert_eq!(boat.label("BIGGEE"), "Big Gee");
    }

    #[test]
    fn vessel_tag_defaults_to_lowercased_name() {
        let (_dir, path) = write_boat("[boat]\nname = \"Morticia\"\n");
        let boat = load_boat(&path).unwrap();
        assert_eq!(boat.vessel, "morticia");
    }

    #[test]
    fn invalid_boat_file_is_an_error() {
        let (_dir, path) = write_boat("not toml [");
        let err = load_boat(&path).unwrap_err();
        assert!(err.contains("invalid boat config"));
    }

    #[test]
    fn labels_fall_back_to_built_in_then_token() {
        let boat = BoatConfig::default();
        assert_eq!(boat.label("REACHING_SPI"), "Reaching Spi");
        assert_eq!(boat.label("R2"), "R2");
    }
}
