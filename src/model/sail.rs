//! The closed vocabulary of sails the boat can fly.
//!
//! Each slot is a tagged enum rather than a free string, so an illegal
//! sail name is a construction-time error, not a display bug downstream.

use serde::{Deserialize, Serialize};

/// Main sail state, from fully down to the fourth reef.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MainSail {
    /// Main fully down. The rest state.
    #[default]
    Down,
    /// Full main, no reefs.
    Full,
    R1,
    R2,
    R3,
    R4,
}

impl MainSail {
    /// Canonical uppercase token, as stored and displayed.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Down => "DOWN",
            Self::Full => "FULL",
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::R3 => "R3",
            Self::R4 => "R4",
        }
    }

    /// Parses a canonical token. `None` for anything outside the vocabulary.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "DOWN" => Some(Self::Down),
            "FULL" => Some(Self::Full),
            "R1" => Some(Self::R1),
            "R2" => Some(Self::R2),
            "R3" => Some(Self::R3),
            "R4" => Some(Self::R4),
            _ => None,
        }
    }
}

/// Headsail selection: the sail flown from the bow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Headsail {
    /// No headsail flying.
    #[default]
    None,
    /// The working jib. Doubles as a staysail inside a reaching spi.
    Jib,
    J1,
    /// Storm jib.
    Storm,
}

impl Headsail {
    /// Canonical uppercase token. `None` is the empty token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Jib => "JIB",
            Self::J1 => "J1",
            Self::Storm => "STORM",
        }
    }

    /// Parses a canonical token. The empty token is `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "" => Some(Self::None),
            "JIB" => Some(Self::Jib),
            "J1" => Some(Self::J1),
            "STORM" => Some(Self::Storm),
            _ => None,
        }
    }
}

/// Downwind sail selection: the spinnaker family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownwindSail {
    /// No downwind sail flying.
    #[default]
    None,
    Biggee,
    /// The reaching spinnaker. The only downwind sail that tolerates a
    /// headsail alongside it (the jib, in staysail mode).
    ReachingSpi,
    Whomper,
}

impl DownwindSail {
    /// Canonical uppercase token. `None` is the empty token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Biggee => "BIGGEE",
            Self::ReachingSpi => "REACHING_SPI",
            Self::Whomper => "WHOMPER",
        }
    }

    /// Parses a canonical token. The empty token is `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "" => Some(Self::None),
            "BIGGEE" => Some(Self::Biggee),
            "REACHING_SPI" => Some(Self::ReachingSpi),
            "WHOMPER" => Some(Self::Whomper),
            _ => None,
        }
    }
}
