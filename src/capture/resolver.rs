//! Control resolution - who holds a region this tick
//!
//! Strict plurality wins. Any tie at the top is contested, never an arbitrary winner.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::FactionId;

/// Living, eligible combatants per faction inside a region
pub type Tally = AHashMap<FactionId, u32>;

/// Result of resolving a tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Controlled(FactionId),
    Contested,
    #[default]
    Empty,
}

impl Decision {
    /// The controlling faction, if exactly one holds the region
    pub fn controller(&self) -> Option<FactionId> {
        match self {
            Decision::Controlled(faction) => Some(*faction),
            Decision::Contested | Decision::Empty => None,
        }
    }
}

/// Resolve a tally into a control decision
///
/// The result does not depend on map iteration order.
pub fn resolve(tally: &Tally) -> Decision {
    let mut best: Option<(FactionId, u32)> = None;
    let mut tied = false;

    for (&faction, &count) in tally.iter() {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, max)) if count < max => {}
            Some((_, max)) if count == max => tied = true,
            _ => {
                best = Some((faction, count));
                tied = false;
            }
        }
    }

    match best {
        None => Decision::Empty,
        Some(_) if tied => Decision::Contested,
        Some((faction, _)) => Decision::Controlled(faction),
    }
}
