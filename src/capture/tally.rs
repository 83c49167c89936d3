//! Faction tally - counting living combatants inside a region
//!
//! The spatial query belongs to the host. `CombatantRoster` is the in-process
//! implementation used by the headless runner and the tests.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::resolver::Tally;
use crate::core::types::{EntityId, FactionId, RegionId, Vec2};

/// Parameters for one region's occupancy query
#[derive(Debug, Clone, Copy)]
pub struct TallyQuery<'a> {
    pub region: RegionId,
    pub location: Vec2,
    pub radius: f32,
    pub eligible: &'a [FactionId],
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TallyError {
    #[error("No map entity for {0}")]
    LocationMissing(RegionId),
}

/// Capability that counts living, eligible combatants per faction in a region
///
/// Implementations must leave out dead and incapacitated combatants and any
/// faction not listed in `query.eligible`.
pub trait FactionTally {
    fn query_faction_tally(&self, query: &TallyQuery<'_>) -> Result<Tally, TallyError>;
}

/// Health state of a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MobState {
    Alive,
    Critical,
    Dead,
}

/// A combatant tracked by the roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: EntityId,
    pub factions: Vec<FactionId>,
    pub position: Vec2,
    pub state: MobState,
}

impl Combatant {
    pub fn is_alive(&self) -> bool {
        self.state == MobState::Alive
    }
}

/// Combatants and region anchors on a flat map
#[derive(Debug, Clone, Default)]
pub struct CombatantRoster {
    combatants: AHashMap<EntityId, Combatant>,
    anchors: AHashSet<RegionId>,
}

impl CombatantRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the map entity backing a region
    pub fn anchor(&mut self, region: RegionId) {
        self.anchors.insert(region);
    }

    /// Remove a region's map entity; later queries for it fail
    pub fn remove_anchor(&mut self, region: RegionId) {
        self.anchors.remove(&region);
    }

    pub fn spawn(&mut self, factions: Vec<FactionId>, position: Vec2) -> EntityId {
        let id = EntityId::new();
        self.combatants.insert(
            id,
            Combatant {
                id,
                factions,
                position,
                state: MobState::Alive,
            },
        );
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    /// Move a combatant, returns false if it is unknown
    pub fn move_to(&mut self, id: EntityId, position: Vec2) -> bool {
        match self.combatants.get_mut(&id) {
            Some(c) => {
                c.position = position;
                true
            }
            None => false,
        }
    }

    /// Set a combatant's health state, returns false if it is unknown
    pub fn set_state(&mut self, id: EntityId, state: MobState) -> bool {
        match self.combatants.get_mut(&id) {
            Some(c) => {
                c.state = state;
                true
            }
            None => false,
        }
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Combatant> {
        self.combatants.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.combatants.values()
    }
}

impl FactionTally for CombatantRoster {
    fn query_faction_tally(&self, query: &TallyQuery<'_>) -> Result<Tally, TallyError> {
        if !self.anchors.contains(&query.region) {
            return Err(TallyError::LocationMissing(query.region));
        }

        let mut tally: Tally = query.eligible.iter().map(|&f| (f, 0)).collect();

        for combatant in self.combatants.values() {
            if !combatant.is_alive() || combatant.position.distance(&query.location) > query.radius {
                continue;
            }
            // A member of several eligible factions counts toward each of them
            for faction in &combatant.factions {
                if let Some(count) = tally.get_mut(faction) {
                    *count += 1;
                }
            }
        }

        Ok(tally)
    }
}
