//! One player's half of the field.

use arrayvec::ArrayVec;

use crate::config::EngineConfig;
use crate::effect::EffectId;
use crate::state::{Attached, CombatantId};

/// Index of a side (0 or 1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideId(pub u8);

impl core::fmt::Display for SideId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "side#{}", self.0)
    }
}

/// A side: its active slots, bench order, and attached conditions.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Side {
    pub id: SideId,
    /// Active slots, left to right. `None` marks an empty slot awaiting a
    /// replacement.
    pub active: ArrayVec<Option<CombatantId>, { EngineConfig::MAX_ACTIVE_PER_SIDE }>,
    /// Team members in current selection order; leads come first.
    pub team: Vec<CombatantId>,
    /// Side-wide conditions in attach order.
    pub conditions: Vec<Attached>,
    /// Per-slot conditions in attach order, indexed by slot.
    pub slot_conditions: ArrayVec<Vec<Attached>, { EngineConfig::MAX_ACTIVE_PER_SIDE }>,
}

impl Side {
    pub fn new(id: SideId, active_slots: usize) -> Self {
        let mut active = ArrayVec::new();
        let mut slot_conditions = ArrayVec::new();
        for _ in 0..active_slots {
            active.push(None);
            slot_conditions.push(Vec::new());
        }
        Self {
            id,
            active,
            team: Vec::new(),
            conditions: Vec::new(),
            slot_conditions,
        }
    }

    pub fn condition(&self, effect: EffectId) -> Option<&Attached> {
        self.conditions.iter().find(|c| c.effect == effect)
    }

    pub fn slot_condition(&self, slot: u8, effect: EffectId) -> Option<&Attached> {
        self.slot_conditions
            .get(slot as usize)
            .and_then(|conditions| conditions.iter().find(|c| c.effect == effect))
    }

    /// Combatants currently occupying a slot, left to right.
    pub fn active_combatants(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.active.iter().filter_map(|slot| *slot)
    }

    /// Slot currently occupied by `combatant`, if any.
    pub fn slot_of(&self, combatant: CombatantId) -> Option<u8> {
        self.active
            .iter()
            .position(|slot| *slot == Some(combatant))
            .map(|slot| slot as u8)
    }
}
