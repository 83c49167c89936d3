//! Region control state machine
//!
//! Each region is advanced once per tick with the latest resolver decision.
//! Transitions never talk to the outside world; they return `RegionEvent`s
//! for the caller to turn into announcements and round-end checks.

use serde::{Deserialize, Serialize};

use crate::capture::constants::{
    DEFAULT_CAPTURE_DURATION, DEFAULT_CAPTURE_RADIUS, DEFAULT_CONTESTED_RESET_WINDOW,
    ONE_MINUTE_WARNING, TWO_MINUTE_WARNING,
};
use crate::capture::resolver::Decision;
use crate::capture::tally::TallyQuery;
use crate::core::types::{FactionId, RegionId, Vec2};

/// How a direct flip from one controller to another is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffPolicy {
    /// Lost/gained pair in the same tick, capture progress restarts
    #[default]
    Instant,
    /// The newcomer has to outlast the contested window first
    Contested,
}

/// A capturable area, fixed for the whole round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub location: Vec2,
    pub radius: f32,
    pub eligible_factions: Vec<FactionId>,
    pub capture_duration: f32,
    pub contested_reset_window: f32,
}

impl Region {
    pub fn new(id: RegionId, name: impl Into<String>, location: Vec2, eligible_factions: Vec<FactionId>) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            radius: DEFAULT_CAPTURE_RADIUS,
            eligible_factions,
            capture_duration: DEFAULT_CAPTURE_DURATION,
            contested_reset_window: DEFAULT_CONTESTED_RESET_WINDOW,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_capture_duration(mut self, seconds: f32) -> Self {
        self.capture_duration = seconds;
        self
    }

    pub fn with_contested_reset_window(mut self, seconds: f32) -> Self {
        self.contested_reset_window = seconds;
        self
    }

    pub fn is_eligible(&self, faction: FactionId) -> bool {
        self.eligible_factions.contains(&faction)
    }

    pub fn tally_query(&self) -> TallyQuery<'_> {
        TallyQuery {
            region: self.id,
            location: self.location,
            radius: self.radius,
            eligible: &self.eligible_factions,
        }
    }
}

/// Countdown warning thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownWarning {
    TwoMinutes,
    OneMinute,
}

/// Something that happened to a region during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionEvent {
    GainedControl { faction: FactionId },
    LostControl { faction: FactionId },
    Countdown { faction: FactionId, warning: CountdownWarning },
    Captured { faction: FactionId },
}

/// Per-tick inputs that come from the match rather than the region
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionContext {
    pub handoff: HandoffPolicy,
    /// Faction whose countdown is never announced (the Asymmetric defender)
    pub quiet_faction: Option<FactionId>,
}

/// Mutable control state of one region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionState {
    pub controller: Option<FactionId>,
    pub capture_elapsed: f32,
    pub contested_elapsed: f32,
    /// Controller at the moment the current contest began
    pub last_controller: Option<FactionId>,
    pub announced_two_minutes: bool,
    pub announced_one_minute: bool,
    pub capture_completed: bool,
    /// The controller's loss was announced when the contested window ran out.
    /// It stays controller until someone takes the region.
    pub loss_announced: bool,
    pub occupied: bool,
    pub last_decision: Decision,
}

impl RegionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of the capture duration held so far
    pub fn progress(&self, region: &Region) -> f32 {
        (self.capture_elapsed / region.capture_duration).clamp(0.0, 1.0)
    }

    /// Seconds left until the current controller captures, if any
    pub fn time_remaining(&self, region: &Region) -> Option<f32> {
        self.controller
            .map(|_| (region.capture_duration - self.capture_elapsed).max(0.0))
    }

    /// Advance by `dt` seconds with this tick's decision
    pub fn advance(
        &mut self,
        region: &Region,
        decision: Decision,
        dt: f32,
        ctx: &TransitionContext,
    ) -> Vec<RegionEvent> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut events = Vec::new();

        self.last_decision = decision;
        self.occupied = decision.controller().is_some();

        match (decision, self.controller) {
            (Decision::Controlled(faction), Some(current)) if faction == current && !self.loss_announced => {
                self.hold(region, faction, dt, ctx, &mut events);
            }
            (Decision::Controlled(faction), Some(_))
                if ctx.handoff == HandoffPolicy::Contested && !self.loss_announced =>
            {
                self.contest(region, dt, Some(faction), &mut events);
            }
            (Decision::Controlled(faction), _) => {
                self.change_controller(faction, &mut events);
            }
            (Decision::Contested | Decision::Empty, _) => {
                self.contest(region, dt, None, &mut events);
            }
        }

        self.enforce_invariants(region);
        events
    }

    fn hold(
        &mut self,
        region: &Region,
        faction: FactionId,
        dt: f32,
        ctx: &TransitionContext,
        events: &mut Vec<RegionEvent>,
    ) {
        self.contested_elapsed = 0.0;
        self.last_controller = None;
        self.capture_elapsed += dt;

        let remaining = region.capture_duration - self.capture_elapsed;
        let announce = ctx.quiet_faction != Some(faction) && self.capture_elapsed > 0.0 && remaining > 0.0;

        if announce {
            if remaining <= ONE_MINUTE_WARNING && !self.announced_one_minute {
                // An overshoot past both thresholds only reports the nearer one
                self.announced_one_minute = true;
                self.announced_two_minutes = true;
                events.push(RegionEvent::Countdown {
                    faction,
                    warning: CountdownWarning::OneMinute,
                });
            } else if remaining <= TWO_MINUTE_WARNING && !self.announced_two_minutes {
                self.announced_two_minutes = true;
                events.push(RegionEvent::Countdown {
                    faction,
                    warning: CountdownWarning::TwoMinutes,
                });
            }
        }

        if remaining <= 0.0 && !self.capture_completed {
            self.capture_completed = true;
            events.push(RegionEvent::Captured { faction });
        }
    }

    fn contest(
        &mut self,
        region: &Region,
        dt: f32,
        challenger: Option<FactionId>,
        events: &mut Vec<RegionEvent>,
    ) {
        if self.contested_elapsed == 0.0 {
            self.last_controller = self.controller;
        }
        self.contested_elapsed += dt;

        if self.contested_elapsed < region.contested_reset_window {
            return;
        }

        self.reset_progress();
        self.last_controller = None;
        if let Some(lost) = self.controller.filter(|_| !self.loss_announced) {
            self.loss_announced = true;
            events.push(RegionEvent::LostControl { faction: lost });
        }

        if let Some(faction) = challenger {
            self.change_controller(faction, events);
        }
    }

    fn change_controller(&mut self, faction: FactionId, events: &mut Vec<RegionEvent>) {
        if let Some(old) = self.controller.filter(|_| !self.loss_announced) {
            events.push(RegionEvent::LostControl { faction: old });
        }
        events.push(RegionEvent::GainedControl { faction });

        self.controller = Some(faction);
        self.loss_announced = false;
        self.reset_progress();
        self.contested_elapsed = 0.0;
        self.last_controller = None;
    }

    fn reset_progress(&mut self) {
        self.capture_elapsed = 0.0;
        self.announced_two_minutes = false;
        self.announced_one_minute = false;
        self.capture_completed = false;
    }

    /// Panics in debug builds, clamps and logs in release builds
    fn enforce_invariants(&mut self, region: &Region) {
        if self.loss_announced && self.controller.is_none() {
            invariant_violation(region, "loss announced without a controller", 0.0);
            self.loss_announced = false;
        }
        if self.capture_elapsed.is_nan() || self.capture_elapsed < 0.0 {
            invariant_violation(region, "capture_elapsed", self.capture_elapsed);
            self.reset_progress();
        }
        if self.contested_elapsed.is_nan() || self.contested_elapsed < 0.0 {
            invariant_violation(region, "contested_elapsed", self.contested_elapsed);
            self.contested_elapsed = 0.0;
        }
        if self.capture_elapsed == 0.0
            && (self.announced_two_minutes || self.announced_one_minute || self.capture_completed)
        {
            invariant_violation(region, "announcement flags", self.capture_elapsed);
            self.reset_progress();
        }
    }
}

fn invariant_violation(region: &Region, what: &str, value: f32) {
    if cfg!(debug_assertions) {
        panic!("region '{}' invariant violated: {} ({})", region.name, what, value);
    }
    tracing::error!(region = %region.name, value, "invariant violated: {}, clamping", what);
}
