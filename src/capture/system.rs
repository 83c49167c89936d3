//! Capture system - runs every region and the match rule once per tick
//!
//! A tick produces a `TickReport`: the announcements to broadcast and, at most
//! once per round, the outcome to hand to the round authority. Nothing is sent
//! from inside the tick itself.

use serde::{Deserialize, Serialize};

use crate::capture::announce::{Announcement, Broadcast};
use crate::capture::region::{
    CountdownWarning, HandoffPolicy, Region, RegionEvent, RegionState, TransitionContext,
};
use crate::capture::resolver::{resolve, Decision};
use crate::capture::rules::{CaptureVerdict, MatchMode, MatchRule, RoundOutcome};
use crate::capture::tally::FactionTally;
use crate::core::config::{FactionRoster, RoundConfig};
use crate::core::error::Result;
use crate::core::types::{FactionId, RegionId, Tick};

/// Authority that ends the round
pub trait RoundAuthority {
    fn signal_round_end(&mut self, outcome: &RoundOutcome);
}

/// Records round-end signals in memory
impl RoundAuthority for Vec<RoundOutcome> {
    fn signal_round_end(&mut self, outcome: &RoundOutcome) {
        self.push(*outcome);
    }
}

/// Everything one tick wants the outside world to know
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: Tick,
    pub events: Vec<(RegionId, RegionEvent)>,
    pub announcements: Vec<Announcement>,
    pub round_end: Option<RoundOutcome>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.announcements.is_empty() && self.round_end.is_none()
    }

    /// Send announcements, then the round-end signal if this tick ended the round
    pub fn dispatch<B, A>(&self, broadcast: &mut B, authority: &mut A)
    where
        B: Broadcast + ?Sized,
        A: RoundAuthority + ?Sized,
    {
        for announcement in &self.announcements {
            broadcast.announce(
                &announcement.message,
                announcement.category.as_str(),
                announcement.color,
            );
        }
        if let Some(outcome) = &self.round_end {
            authority.signal_round_end(outcome);
        }
    }
}

/// Territorial control for one round
#[derive(Debug, Clone)]
pub struct CaptureSystem {
    roster: FactionRoster,
    regions: Vec<Region>,
    states: Vec<RegionState>,
    rule: MatchRule,
    handoff: HandoffPolicy,
    current_tick: Tick,
}

impl CaptureSystem {
    /// Validate the configuration and set up fresh region state
    pub fn start_round(config: RoundConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            mode = config.mode.name(),
            regions = config.regions.len(),
            factions = config.roster.len(),
            "capture round started"
        );

        let states = vec![RegionState::new(); config.regions.len()];
        Ok(Self {
            roster: config.roster,
            regions: config.regions,
            states,
            rule: MatchRule::new(config.mode),
            handoff: config.handoff,
            current_tick: 0,
        })
    }

    /// Start a new round on the same map, discarding all region state
    pub fn restart(&mut self) {
        for state in &mut self.states {
            *state = RegionState::new();
        }
        self.rule.reset();
        self.current_tick = 0;
    }

    pub fn roster(&self) -> &FactionRoster {
        &self.roster
    }

    pub fn mode(&self) -> &MatchMode {
        &self.rule.mode
    }

    pub fn rule(&self) -> &MatchRule {
        &self.rule
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn is_round_over(&self) -> bool {
        self.rule.is_round_over()
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.rule.outcome()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0 as usize)
    }

    pub fn state(&self, id: RegionId) -> Option<&RegionState> {
        self.states.get(id.0 as usize)
    }

    pub fn regions(&self) -> impl Iterator<Item = (&Region, &RegionState)> + '_ {
        self.regions.iter().zip(self.states.iter())
    }

    /// Advance the round by `dt` seconds
    ///
    /// Once the round has ended every further tick is a no-op.
    pub fn tick<T: FactionTally + ?Sized>(&mut self, dt: f32, tally: &T) -> TickReport {
        let mut report = TickReport {
            tick: self.current_tick,
            ..TickReport::default()
        };
        if self.rule.is_round_over() {
            return report;
        }

        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            tracing::warn!(dt, "ignoring invalid frame time");
            0.0
        };
        self.current_tick += 1;
        report.tick = self.current_tick;

        if let Some(outcome) = self.rule.on_tick(dt) {
            if let MatchMode::Asymmetric { defender_timeout, .. } = self.rule.mode {
                let name = self.roster.display_name(outcome.winner());
                tracing::info!(defender = name, "defender survived the timer");
                report
                    .announcements
                    .push(Announcement::defender_victory(name, defender_timeout));
            }
            report.round_end = Some(outcome);
            return report;
        }

        let ctx = TransitionContext {
            handoff: self.handoff,
            quiet_faction: self.rule.mode.defender(),
        };

        'regions: for (region, state) in self.regions.iter().zip(self.states.iter_mut()) {
            let decision = match tally.query_faction_tally(&region.tally_query()) {
                Ok(mut counts) => {
                    counts.retain(|faction, _| region.is_eligible(*faction));
                    resolve(&counts)
                }
                Err(err) => {
                    tracing::warn!(region = %region.name, error = %err, "tally failed, treating region as empty");
                    Decision::Empty
                }
            };

            for event in state.advance(region, decision, dt, &ctx) {
                report.events.push((region.id, event));

                let RegionEvent::Captured { faction } = event else {
                    log_event(&self.roster, region, &event);
                    if let Some(announcement) = announcement_for(&self.roster, region, &event) {
                        report.announcements.push(announcement);
                    }
                    continue;
                };

                match self.rule.on_region_captured(region.id, faction) {
                    CaptureVerdict::Victory(outcome) => {
                        let name = self.roster.display_name(faction);
                        tracing::info!(region = %region.name, faction = name, "region captured, round won");
                        report
                            .announcements
                            .push(Announcement::capture_victory(name, &region.name));
                        report.round_end = Some(outcome);
                        break 'regions;
                    }
                    CaptureVerdict::DefenderHold => {
                        tracing::info!(
                            region = %region.name,
                            faction = self.roster.display_name(faction),
                            "defender completed a hold, round continues"
                        );
                    }
                    CaptureVerdict::RoundOver => break 'regions,
                }
            }
        }

        report
    }

    /// End-of-round text, one line per entry
    pub fn round_summary(&self) -> Vec<String> {
        let mut lines = Vec::new();

        match self.rule.outcome() {
            Some(RoundOutcome::CaptureVictory { faction, region }) => {
                let region_name = self.region(region).map(|r| r.name.as_str()).unwrap_or("an objective");
                lines.push(format!(
                    "{} captured {} and won the round!",
                    self.roster.display_name(faction),
                    region_name
                ));
            }
            Some(RoundOutcome::DefenderVictory { faction }) => {
                lines.push(format!(
                    "{} held out and won the round!",
                    self.roster.display_name(faction)
                ));
            }
            None => lines.push("The round is still in progress.".to_string()),
        }
        lines.push(String::new());

        for (region, state) in self.regions() {
            let line = match state.controller {
                Some(faction) if state.loss_announced => format!(
                    "{}: contested, last held by {}",
                    region.name,
                    self.roster.display_name(faction)
                ),
                Some(faction) => format!(
                    "{}: held by {} ({:.0}% captured)",
                    region.name,
                    self.roster.display_name(faction),
                    state.progress(region) * 100.0
                ),
                None => format!("{}: uncontrolled", region.name),
            };
            lines.push(line);
        }

        lines
    }

    /// Seconds the defender still has to hold out, in Asymmetric mode
    pub fn defender_time_remaining(&self) -> Option<f32> {
        match self.rule.mode {
            MatchMode::Asymmetric { defender_timeout, .. } => {
                Some((defender_timeout - self.rule.elapsed_defender_time).max(0.0))
            }
            MatchMode::KingOfTheHill | MatchMode::Symmetric => None,
        }
    }

    /// Regions currently controlled by a faction
    pub fn held_by(&self, faction: FactionId) -> impl Iterator<Item = &Region> + '_ {
        self.regions()
            .filter(move |(_, state)| state.controller == Some(faction))
            .map(|(region, _)| region)
    }
}

fn announcement_for(roster: &FactionRoster, region: &Region, event: &RegionEvent) -> Option<Announcement> {
    let announcement = match *event {
        RegionEvent::GainedControl { faction } => {
            Announcement::gained_control(roster.display_name(faction), &region.name)
        }
        RegionEvent::LostControl { faction } => {
            Announcement::lost_control(roster.display_name(faction), &region.name)
        }
        RegionEvent::Countdown { faction, warning: CountdownWarning::TwoMinutes } => {
            Announcement::two_minute_warning(roster.display_name(faction), &region.name)
        }
        RegionEvent::Countdown { faction, warning: CountdownWarning::OneMinute } => {
            Announcement::one_minute_warning(roster.display_name(faction), &region.name)
        }
        RegionEvent::Captured { .. } => return None,
    };
    Some(announcement)
}

fn log_event(roster: &FactionRoster, region: &Region, event: &RegionEvent) {
    match *event {
        RegionEvent::GainedControl { faction } => {
            tracing::debug!(region = %region.name, faction = roster.display_name(faction), "gained control");
        }
        RegionEvent::LostControl { faction } => {
            tracing::debug!(region = %region.name, faction = roster.display_name(faction), "lost control");
        }
        RegionEvent::Countdown { faction, warning } => {
            tracing::debug!(region = %region.name, faction = roster.display_name(faction), ?warning, "capture countdown");
        }
        RegionEvent::Captured { .. } => {}
    }
}
