//! Round configuration loaded from TOML
//!
//! A round file declares the factions, the match mode and the capturable regions.
//! Everything is checked here, before the round starts:
//! - faction keys are resolved to `FactionId`s, unknown keys are rejected
//! - Asymmetric mode must name a declared defender
//! - durations and radii must be positive
//!
//! ```toml
//! [[faction]]
//! key = "SovietCW"
//! name = "Soviet Union"
//!
//! [match]
//! mode = "asymmetric"
//! defender = "SovietCW"
//! defender_timeout = 2400.0
//!
//! [[region]]
//! name = "Hill 203"
//! location = { x = 0.0, y = 0.0 }
//! factions = ["SovietCW", "German"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::capture::constants::{
    DEFAULT_CAPTURE_DURATION, DEFAULT_CAPTURE_RADIUS, DEFAULT_CONTESTED_RESET_WINDOW,
    DEFAULT_DEFENDER_TIMEOUT,
};
use crate::capture::region::{HandoffPolicy, Region};
use crate::capture::rules::MatchMode;
use crate::core::error::{CaptureError, Result};
use crate::core::types::{FactionId, RegionId, Vec2};

/// A declared faction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionEntry {
    /// Identifier used in round files and by the tally
    pub key: String,
    /// Display name used in announcements
    pub name: String,
}

/// The closed set of factions taking part in a round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionRoster {
    factions: Vec<FactionEntry>,
}

impl FactionRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roster whose display names equal their keys
    pub fn from_keys<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut roster = Self::new();
        for key in keys {
            let key = key.into();
            roster.insert(key.clone(), key)?;
        }
        Ok(roster)
    }

    pub fn insert(&mut self, key: impl Into<String>, name: impl Into<String>) -> Result<FactionId> {
        let key = key.into();
        if self.lookup(&key).is_some() {
            return Err(CaptureError::DuplicateFaction(key));
        }
        let index = u16::try_from(self.factions.len())
            .map_err(|_| CaptureError::TooManyFactions(self.factions.len() + 1))?;
        let id = FactionId(index);
        self.factions.push(FactionEntry {
            key,
            name: name.into(),
        });
        Ok(id)
    }

    pub fn lookup(&self, key: &str) -> Option<FactionId> {
        self.factions
            .iter()
            .position(|f| f.key == key)
            .and_then(|i| u16::try_from(i).ok())
            .map(FactionId)
    }

    /// Resolve a key or fail with `UnknownFaction`
    pub fn require(&self, key: &str) -> Result<FactionId> {
        self.lookup(key)
            .ok_or_else(|| CaptureError::UnknownFaction(key.to_string()))
    }

    pub fn contains(&self, id: FactionId) -> bool {
        (id.0 as usize) < self.factions.len()
    }

    pub fn key(&self, id: FactionId) -> Option<&str> {
        self.factions.get(id.0 as usize).map(|f| f.key.as_str())
    }

    /// Display name, falling back to a placeholder for ids from another roster
    pub fn display_name(&self, id: FactionId) -> &str {
        self.factions
            .get(id.0 as usize)
            .map(|f| f.name.as_str())
            .unwrap_or("Unknown faction")
    }

    pub fn len(&self) -> usize {
        self.factions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = FactionId> + '_ {
        (0..self.factions.len())
            .filter_map(|i| u16::try_from(i).ok())
            .map(FactionId)
    }
}

// === FILE FORMAT ===

#[derive(Debug, Clone, Deserialize)]
struct RoundFile {
    #[serde(rename = "faction", default)]
    factions: Vec<FactionFileEntry>,
    #[serde(rename = "match", default)]
    match_settings: MatchSettings,
    #[serde(rename = "region", default)]
    regions: Vec<RegionFileEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct FactionFileEntry {
    key: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct MatchSettings {
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default)]
    defender: Option<String>,
    #[serde(default = "default_defender_timeout")]
    defender_timeout: f32,
    #[serde(default)]
    handoff: HandoffPolicy,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            defender: None,
            defender_timeout: default_defender_timeout(),
            handoff: HandoffPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RegionFileEntry {
    name: String,
    location: Vec2,
    #[serde(default = "default_radius")]
    radius: f32,
    #[serde(default)]
    factions: Vec<String>,
    #[serde(default = "default_capture_duration")]
    capture_duration: f32,
    #[serde(default = "default_contested_reset_window")]
    contested_reset_window: f32,
}

fn default_mode() -> String {
    "king_of_the_hill".to_string()
}

fn default_defender_timeout() -> f32 {
    DEFAULT_DEFENDER_TIMEOUT
}

fn default_radius() -> f32 {
    DEFAULT_CAPTURE_RADIUS
}

fn default_capture_duration() -> f32 {
    DEFAULT_CAPTURE_DURATION
}

fn default_contested_reset_window() -> f32 {
    DEFAULT_CONTESTED_RESET_WINDOW
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeKind {
    KingOfTheHill,
    Asymmetric,
    Symmetric,
}

/// Mode names as written in round files, including the long forms map makers use
fn parse_mode_name(name: &str) -> Option<ModeKind> {
    let normalized: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    match normalized.as_str() {
        "kingofthehill" | "koth" => Some(ModeKind::KingOfTheHill),
        "asymmetric" => Some(ModeKind::Asymmetric),
        "symmetric" => Some(ModeKind::Symmetric),
        _ => None,
    }
}

// === VALIDATED CONFIG ===

/// Validated settings for one round
#[derive(Debug, Clone)]
pub struct RoundConfig {
    pub roster: FactionRoster,
    pub mode: MatchMode,
    pub handoff: HandoffPolicy,
    pub regions: Vec<Region>,
}

impl RoundConfig {
    pub fn new(roster: FactionRoster, mode: MatchMode) -> Self {
        Self {
            roster,
            mode,
            handoff: HandoffPolicy::default(),
            regions: Vec::new(),
        }
    }

    pub fn with_handoff(mut self, handoff: HandoffPolicy) -> Self {
        self.handoff = handoff;
        self
    }

    /// Add a region, assigning it the next id
    pub fn add_region(&mut self, mut region: Region) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        region.id = id;
        self.regions.push(region);
        id
    }

    /// Load and validate a round file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate round TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RoundFile = toml::from_str(content)?;

        let mut roster = FactionRoster::new();
        for entry in &file.factions {
            let name = entry.name.clone().unwrap_or_else(|| entry.key.clone());
            roster.insert(entry.key.clone(), name)?;
        }

        let settings = &file.match_settings;
        let kind = parse_mode_name(&settings.mode)
            .ok_or_else(|| CaptureError::UnknownMode(settings.mode.clone()))?;
        let mode = match kind {
            ModeKind::KingOfTheHill => MatchMode::KingOfTheHill,
            ModeKind::Symmetric => MatchMode::Symmetric,
            ModeKind::Asymmetric => {
                let key = settings
                    .defender
                    .as_deref()
                    .filter(|k| !k.is_empty())
                    .ok_or(CaptureError::MissingDefender)?;
                MatchMode::Asymmetric {
                    defender: roster.require(key)?,
                    defender_timeout: settings.defender_timeout,
                }
            }
        };

        let mut config = RoundConfig::new(roster, mode).with_handoff(settings.handoff);
        for entry in file.regions {
            let factions = entry
                .factions
                .iter()
                .map(|key| config.roster.require(key))
                .collect::<Result<Vec<_>>>()?;
            let region = Region::new(RegionId(0), entry.name, entry.location, factions)
                .with_radius(entry.radius)
                .with_capture_duration(entry.capture_duration)
                .with_contested_reset_window(entry.contested_reset_window);
            config.add_region(region);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    ///
    /// Also run by `CaptureSystem::start_round`, so hand-built configs get the same checks.
    pub fn validate(&self) -> Result<()> {
        if let MatchMode::Asymmetric { defender, defender_timeout } = self.mode {
            if !self.roster.contains(defender) {
                return Err(CaptureError::MissingDefender);
            }
            check_duration("defender_timeout", defender_timeout)?;
        }

        for (index, region) in self.regions.iter().enumerate() {
            // Region state is stored by index, ids must follow declaration order
            if region.id.0 as usize != index {
                return Err(CaptureError::RegionIdMismatch {
                    region: region.name.clone(),
                    expected: index,
                    found: region.id,
                });
            }
            check_duration(&format!("{}.capture_duration", region.name), region.capture_duration)?;
            check_duration(
                &format!("{}.contested_reset_window", region.name),
                region.contested_reset_window,
            )?;
            if !(region.radius.is_finite() && region.radius > 0.0) {
                return Err(CaptureError::InvalidRadius {
                    region: region.name.clone(),
                    value: region.radius,
                });
            }
            if let Some(stray) = region.eligible_factions.iter().find(|f| !self.roster.contains(**f)) {
                return Err(CaptureError::UnknownFaction(format!("{:?}", stray)));
            }
            if region.eligible_factions.is_empty() {
                tracing::warn!(region = %region.name, "region has no eligible factions and can never be controlled");
            }
        }

        Ok(())
    }
}

fn check_duration(field: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CaptureError::InvalidDuration {
            field: field.to_string(),
            value,
        })
    }
}
