//! Error taxonomy shared by the store, renderer, controllers and transport

use thiserror::Error;

/// Axis of a profile's bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LevelError {
    #[error("profile '{0}' already exists")]
    DuplicateProfileName(String),
    #[error("profile name must not be empty")]
    InvalidProfileName,
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),
    #[error("the '{0}' profile cannot be removed")]
    ReservedProfile(String),
    #[error("degenerate {axis} bounds: min {min} max {max}")]
    InvalidBounds { axis: Axis, min: f64, max: f64 },
    #[error("invalid value '{value}' for {field}")]
    InvalidField { field: &'static str, value: String },
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("{0} has no profiles")]
    NoProfiles(&'static str),
    #[error("a probing run is in progress")]
    ProbeInProgress,
    #[error("saving settings failed: {0}")]
    Persistence(String),
    #[error("request failed: {0}")]
    Network(String),
    #[error("malformed data: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for LevelError {
    fn from(e: serde_json::Error) -> Self {
        LevelError::Decode(e.to_string())
    }
}
