//! Territorial control - capture areas, contested timers and round victory
//!
//! Each tick, every region asks the tally who is standing in it, the resolver
//! turns the counts into a decision, and the region state machine applies it.
//! The match rule decides whether a finished capture ends the round, and in
//! Asymmetric mode runs the defender's survival clock.
//!
//! Side effects leave the system as data (`TickReport`), never as calls made
//! mid-transition.

pub mod announce;
pub mod constants;
pub mod region;
pub mod resolver;
pub mod rules;
pub mod system;
pub mod tally;

// Re-exports for convenient access
pub use announce::{Announcement, AnnouncementCategory, Broadcast};
pub use constants::*;
pub use region::{
    CountdownWarning, HandoffPolicy, Region, RegionEvent, RegionState, TransitionContext,
};
pub use resolver::{resolve, Decision, Tally};
pub use rules::{CaptureVerdict, MatchMode, MatchRule, RoundOutcome};
pub use system::{CaptureSystem, RoundAuthority, TickReport};
pub use tally::{Combatant, CombatantRoster, FactionTally, MobState, TallyError, TallyQuery};
