use thiserror::Error;

use crate::core::types::RegionId;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Unknown faction: {0}")]
    UnknownFaction(String),

    #[error("Faction declared twice: {0}")]
    DuplicateFaction(String),

    #[error("Too many factions: {0} (at most 65536)")]
    TooManyFactions(usize),

    #[error("Region '{region}' has id {found} but is declared at position {expected}")]
    RegionIdMismatch {
        region: String,
        expected: usize,
        found: RegionId,
    },

    #[error("Unknown match mode: {0}")]
    UnknownMode(String),

    #[error("Asymmetric mode requires a defender faction")]
    MissingDefender,

    #[error("{field} must be a positive number of seconds, got {value}")]
    InvalidDuration { field: String, value: f32 },

    #[error("Region '{region}' has invalid radius {value}")]
    InvalidRadius { region: String, value: f32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
