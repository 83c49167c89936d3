//! Match rules - which captures end the round, and the defender clock
//!
//! - King of the Hill: every eligible faction fights over the same areas.
//! - Asymmetric: one defender holds out against a timer; only attackers win by capturing.
//! - Symmetric: factions capture each other's bases.

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, RegionId};

/// Round mode, with the settings only that mode needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatchMode {
    KingOfTheHill,
    Asymmetric {
        defender: FactionId,
        /// Seconds the defender must survive
        defender_timeout: f32,
    },
    Symmetric,
}

impl MatchMode {
    pub fn defender(&self) -> Option<FactionId> {
        match self {
            MatchMode::Asymmetric { defender, .. } => Some(*defender),
            MatchMode::KingOfTheHill | MatchMode::Symmetric => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MatchMode::KingOfTheHill => "King of the Hill",
            MatchMode::Asymmetric { .. } => "Asymmetric",
            MatchMode::Symmetric => "Symmetric",
        }
    }
}

/// How a round was won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    CaptureVictory { faction: FactionId, region: RegionId },
    DefenderVictory { faction: FactionId },
}

impl RoundOutcome {
    pub fn winner(&self) -> FactionId {
        match self {
            RoundOutcome::CaptureVictory { faction, .. } => *faction,
            RoundOutcome::DefenderVictory { faction } => *faction,
        }
    }
}

/// What a completed capture means for the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureVerdict {
    /// The capture wins the round
    Victory(RoundOutcome),
    /// Defender capture in Asymmetric mode, recorded and otherwise ignored
    DefenderHold,
    /// The round already ended
    RoundOver,
}

/// Round-wide rule state
#[derive(Debug, Clone)]
pub struct MatchRule {
    pub mode: MatchMode,
    pub elapsed_defender_time: f32,
    outcome: Option<RoundOutcome>,
}

impl MatchRule {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            elapsed_defender_time: 0.0,
            outcome: None,
        }
    }

    /// Clear all per-round state
    pub fn reset(&mut self) {
        self.elapsed_defender_time = 0.0;
        self.outcome = None;
    }

    pub fn is_round_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    /// Advance the defender clock
    ///
    /// Returns the outcome only on the tick the defender wins.
    pub fn on_tick(&mut self, dt: f32) -> Option<RoundOutcome> {
        if self.is_round_over() {
            return None;
        }

        let MatchMode::Asymmetric { defender, defender_timeout } = self.mode else {
            return None;
        };

        self.elapsed_defender_time += dt;
        if self.elapsed_defender_time < defender_timeout {
            return None;
        }

        let outcome = RoundOutcome::DefenderVictory { faction: defender };
        self.outcome = Some(outcome);
        Some(outcome)
    }

    /// Decide whether a completed capture ends the round
    pub fn on_region_captured(&mut self, region: RegionId, controller: FactionId) -> CaptureVerdict {
        if self.is_round_over() {
            return CaptureVerdict::RoundOver;
        }

        if self.mode.defender() == Some(controller) {
            return CaptureVerdict::DefenderHold;
        }

        let outcome = RoundOutcome::CaptureVictory { faction: controller, region };
        self.outcome = Some(outcome);
        CaptureVerdict::Victory(outcome)
    }
}
