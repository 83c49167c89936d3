//! Capture system integration tests
//!
//! Single region, 300 s capture, 10 s contested window, 1 s ticks.

use capture_engine::capture::*;
use capture_engine::core::config::{FactionRoster, RoundConfig};
use capture_engine::core::types::{EntityId, FactionId, RegionId, Vec2};

const HILL: RegionId = RegionId(0);
const FAR_AWAY: Vec2 = Vec2 { x: 500.0, y: 500.0 };

struct Round {
    system: CaptureSystem,
    roster: CombatantRoster,
    heard: Vec<Announcement>,
    ends: Vec<RoundOutcome>,
    ticks: Vec<TickReport>,
}

impl Round {
    fn new(mode: MatchMode, handoff: HandoffPolicy) -> Self {
        let factions = FactionRoster::from_keys(["Attackers", "Raiders", "Defenders"]).unwrap();
        let mut config = RoundConfig::new(factions, mode).with_handoff(handoff);
        config.add_region(
            Region::new(HILL, "Hill", Vec2::new(0.0, 0.0), vec![A, B, D])
                .with_capture_duration(300.0)
                .with_contested_reset_window(10.0),
        );

        let mut roster = CombatantRoster::new();
        roster.anchor(HILL);

        Self {
            system: CaptureSystem::start_round(config).unwrap(),
            roster,
            heard: Vec::new(),
            ends: Vec::new(),
            ticks: Vec::new(),
        }
    }

    fn king_of_the_hill() -> Self {
        Self::new(MatchMode::KingOfTheHill, HandoffPolicy::Instant)
    }

    fn asymmetric(timeout: f32) -> Self {
        Self::new(
            MatchMode::Asymmetric {
                defender: D,
                defender_timeout: timeout,
            },
            HandoffPolicy::Instant,
        )
    }

    fn squad(&mut self, faction: FactionId, size: usize) -> Vec<EntityId> {
        (0..size)
            .map(|i| self.roster.spawn(vec![faction], Vec2::new(i as f32 * 0.5, 0.0)))
            .collect()
    }

    fn leave(&mut self, squad: &[EntityId]) {
        for id in squad {
            self.roster.move_to(*id, FAR_AWAY);
        }
    }

    fn enter(&mut self, squad: &[EntityId]) {
        for id in squad {
            self.roster.move_to(*id, Vec2::new(0.0, 1.0));
        }
    }

    fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            let report = self.system.tick(1.0, &self.roster);
            report.dispatch(&mut self.heard, &mut self.ends);
            self.ticks.push(report);
        }
    }

    fn state(&self) -> &RegionState {
        self.system.state(HILL).unwrap()
    }

    fn count(&self, message: &str) -> usize {
        self.heard.iter().filter(|a| a.message == message).count()
    }
}

const A: FactionId = FactionId(0);
const B: FactionId = FactionId(1);
const D: FactionId = FactionId(2);

#[test]
fn test_uncontested_hold_captures_and_ends_round_once() {
    let mut round = Round::king_of_the_hill();
    round.squad(A, 2);

    round.run(400);

    assert_eq!(round.count("Attackers has gained control of Hill!"), 1);
    assert_eq!(round.count("Attackers has captured Hill and is victorious!"), 1);
    assert_eq!(round.count("Two minutes until Attackers captures Hill!"), 1);
    assert_eq!(round.count("One minute until Attackers captures Hill!"), 1);
    assert_eq!(round.ends, vec![RoundOutcome::CaptureVictory { faction: A, region: HILL }]);

    // Gain on the first tick, then 300 seconds of accumulated hold
    let end_tick = round.ticks.iter().find(|r| r.round_end.is_some()).unwrap().tick;
    assert_eq!(end_tick, 301);
}

#[test]
fn test_brief_intrusion_under_contested_handoff_keeps_progress() {
    let mut round = Round::new(MatchMode::KingOfTheHill, HandoffPolicy::Contested);
    let attackers = round.squad(A, 2);
    round.run(51);
    assert_eq!(round.state().capture_elapsed, 50.0);

    round.leave(&attackers);
    let raiders = round.squad(B, 2);
    round.run(5);
    assert_eq!(round.state().controller, Some(A));
    assert_eq!(round.state().capture_elapsed, 50.0);

    round.leave(&raiders);
    round.enter(&attackers);
    round.run(1);

    assert_eq!(round.state().capture_elapsed, 51.0);
    assert_eq!(round.heard.len(), 1, "only the initial gain: {:?}", round.heard);
    assert_eq!(round.count("Raiders has gained control of Hill!"), 0);
    assert_eq!(round.count("Attackers has lost control of Hill!"), 0);
}

#[test]
fn test_direct_flip_under_instant_handoff_swaps_immediately() {
    let mut round = Round::king_of_the_hill();
    let attackers = round.squad(A, 2);
    round.run(51);

    round.leave(&attackers);
    round.squad(B, 1);
    round.run(1);

    assert_eq!(round.count("Attackers has lost control of Hill!"), 1);
    assert_eq!(round.count("Raiders has gained control of Hill!"), 1);
    assert_eq!(round.state().controller, Some(B));
    assert_eq!(round.state().capture_elapsed, 0.0);
}

#[test]
fn test_empty_past_window_announces_loss_once() {
    let mut round = Round::king_of_the_hill();
    let attackers = round.squad(A, 3);
    round.run(51);

    for id in &attackers {
        round.roster.set_state(*id, MobState::Dead);
    }
    round.run(15);

    assert_eq!(round.count("Attackers has lost control of Hill!"), 1);
    assert_eq!(round.state().controller, Some(A));
    assert_eq!(round.state().capture_elapsed, 0.0);
    assert!(!round.state().announced_two_minutes);
    assert!(!round.state().announced_one_minute);

    // Loss lands on the tick the window fills: gain tick + 50 holds + 10 empty
    let loss_tick = round
        .ticks
        .iter()
        .find(|r| r.events.contains(&(HILL, RegionEvent::LostControl { faction: A })))
        .unwrap()
        .tick;
    assert_eq!(loss_tick, 61);
}

#[test]
fn test_tie_never_flips_controller() {
    let mut round = Round::king_of_the_hill();
    round.squad(A, 3);
    round.squad(B, 3);

    round.run(20);

    assert_eq!(round.state().controller, None);
    assert_eq!(round.state().last_decision, Decision::Contested);
    assert!(round.heard.is_empty());
}

#[test]
fn test_defender_capture_never_ends_round() {
    let mut round = Round::asymmetric(2400.0);
    round.squad(D, 4);

    round.run(400);

    assert!(round.state().capture_completed);
    assert!(round.ends.is_empty());
    assert!(!round.system.is_round_over());
    // Only the gain; the defender's countdown is never narrated
    assert_eq!(round.heard.len(), 1);
    assert!(round
        .ticks
        .iter()
        .any(|r| r.events.contains(&(HILL, RegionEvent::Captured { faction: D }))));
}

#[test]
fn test_attacker_capture_ends_asymmetric_round() {
    let mut round = Round::asymmetric(2400.0);
    round.squad(A, 1);

    round.run(301);

    assert_eq!(round.ends, vec![RoundOutcome::CaptureVictory { faction: A, region: HILL }]);
}

#[test]
fn test_defender_timeout_fires_once() {
    let mut round = Round::asymmetric(600.0);

    round.run(700);

    assert_eq!(round.ends, vec![RoundOutcome::DefenderVictory { faction: D }]);
    assert_eq!(
        round.count("Defenders has successfully defended for 10 minutes and wins the round!"),
        1
    );
    assert!(round.ticks[600..].iter().all(|r| r.is_empty()));
    assert_eq!(round.system.round_summary()[0], "Defenders held out and won the round!");
}

#[test]
fn test_removed_region_entity_is_treated_as_empty() {
    let mut round = Round::king_of_the_hill();
    round.squad(A, 1);
    round.run(51);

    round.roster.remove_anchor(HILL);
    round.run(12);

    assert_eq!(round.count("Attackers has lost control of Hill!"), 1);
    assert_eq!(round.state().last_decision, Decision::Empty);
    assert_eq!(round.state().capture_elapsed, 0.0);
}

#[test]
fn test_tie_after_hold_keeps_controller_and_announces_loss_once() {
    let mut round = Round::king_of_the_hill();
    round.squad(A, 3);
    round.run(51);
    assert_eq!(round.state().capture_elapsed, 50.0);

    let raiders = round.squad(B, 3);
    round.run(20);

    assert_eq!(round.state().controller, Some(A));
    assert_eq!(round.state().capture_elapsed, 0.0);
    assert_eq!(round.state().last_controller, None);
    assert_eq!(
        round.heard.iter().map(|a| a.message.as_str()).collect::<Vec<_>>(),
        vec!["Attackers has gained control of Hill!", "Attackers has lost control of Hill!"]
    );

    // Raiders withdraw, the holder is announced again
    round.leave(&raiders);
    round.run(1);
    assert_eq!(round.count("Attackers has gained control of Hill!"), 2);
    assert_eq!(round.count("Attackers has lost control of Hill!"), 1);
}

#[test]
fn test_takeover_after_tie_does_not_repeat_loss() {
    let mut round = Round::king_of_the_hill();
    let attackers = round.squad(A, 2);
    round.run(51);
    round.squad(B, 2);
    round.run(15);

    round.leave(&attackers);
    round.run(1);

    assert_eq!(round.count("Attackers has lost control of Hill!"), 1);
    assert_eq!(round.count("Raiders has gained control of Hill!"), 1);
    assert_eq!(round.state().controller, Some(B));
}

#[test]
fn test_defender_timeout_beats_capture_on_same_tick() {
    let mut round = Round::new(
        MatchMode::Asymmetric {
            defender: D,
            defender_timeout: 301.0,
        },
        HandoffPolicy::Instant,
    );
    round.squad(A, 2);

    round.run(320);

    assert_eq!(round.ends, vec![RoundOutcome::DefenderVictory { faction: D }]);
    assert_eq!(round.count("Attackers has captured Hill and is victorious!"), 0);
    assert!(!round.state().capture_completed);
    assert_eq!(round.state().capture_elapsed, 299.0);
}
