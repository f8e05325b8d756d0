//! Error types for score delivery, configuration and placement geometry.

use std::fmt;
use std::io;

/// Failure to deliver a final score to the reporting collaborator.
#[derive(Debug)]
pub enum ScoreError {
    /// Leaderboard storage could not be read or written.
    Io(io::Error),
    /// Leaderboard contents could not be encoded or decoded.
    Format(serde_json::Error),
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::Io(e) => write!(f, "score storage unavailable: {e}"),
            ScoreError::Format(e) => write!(f, "score storage corrupt: {e}"),
        }
    }
}

impl std::error::Error for ScoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScoreError::Io(e) => Some(e),
            ScoreError::Format(e) => Some(e),
        }
    }
}

impl From<io::Error> for ScoreError {
    fn from(e: io::Error) -> Self {
        ScoreError::Io(e)
    }
}

impl From<serde_json::Error> for ScoreError {
    fn from(e: serde_json::Error) -> Self {
        ScoreError::Format(e)
    }
}

/// Failure to load or save settings.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
    /// A value is outside the range the simulation accepts.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot access settings: {e}"),
            ConfigError::Parse(e) => write!(f, "malformed settings: {e}"),
            ConfigError::Invalid(what) => write!(f, "invalid setting: {what}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Degenerate input to the gap-finding pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// An extent or bound was NaN or infinite.
    NonFinite,
    /// Left bound is not strictly left of the right bound.
    EmptyBounds { left: f32, right: f32 },
    /// Placed pieces cover the whole span.
    NoGap,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::NonFinite => write!(f, "non-finite extent"),
            GeometryError::EmptyBounds { left, right } => {
                write!(f, "empty span [{left}, {right}]")
            }
            GeometryError::NoGap => write!(f, "no free interval"),
        }
    }
}

impl std::error::Error for GeometryError {}
