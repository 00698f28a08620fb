//! Attachment records for effects bound to holders.

use crate::effect::EffectId;
use crate::state::{CombatantId, SideId};

/// Classification of the entity an effect is attached to. Drives default
/// handler sub-orders and alias selection for bubbling events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum HolderKind {
    Combatant,
    Slot,
    Side,
    Field,
    Battle,
}

/// Reference to a holder: a combatant, one slot of a side, a whole side,
/// the field, or the battle itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HolderRef {
    Combatant(CombatantId),
    Slot(SideId, u8),
    Side(SideId),
    Field,
    Battle,
}

impl HolderRef {
    pub fn kind(self) -> HolderKind {
        match self {
            HolderRef::Combatant(_) => HolderKind::Combatant,
            HolderRef::Slot(..) => HolderKind::Slot,
            HolderRef::Side(_) => HolderKind::Side,
            HolderRef::Field => HolderKind::Field,
            HolderRef::Battle => HolderKind::Battle,
        }
    }

    /// The combatant behind this reference, if it is combatant-scoped.
    pub fn combatant(self) -> Option<CombatantId> {
        match self {
            HolderRef::Combatant(id) => Some(id),
            _ => None,
        }
    }
}

/// Addressable location of one attached effect state inside a battle.
///
/// Handlers mutate their own state through this key rather than holding a
/// `&mut` borrow across re-entrant dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateKey {
    Ability(CombatantId),
    Item(CombatantId),
    Volatile(CombatantId, EffectId),
    SideCondition(SideId, EffectId),
    SlotCondition(SideId, u8, EffectId),
    Weather,
    Terrain,
    PseudoWeather(EffectId),
    Format(EffectId),
}

/// Mutable record for one (effect, holder) pair.
///
/// Created on attach; cleared on detach. `effect_order` is assigned once,
/// from the battle-global counter, when the effect becomes relevant to an
/// active holder, and is never reassigned while attached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectState {
    /// Battle-global tie-break ordinal; 0 until the holder is ordered.
    pub effect_order: u64,
    /// Remaining duration in turns, if the effect expires.
    pub duration: Option<u16>,
    /// Combatant that caused the attachment, if any.
    pub source: Option<CombatantId>,
    /// Field slot the source occupied at attach time.
    pub source_slot: Option<(SideId, u8)>,
    /// Back-reference to the holder; `None` once detached.
    pub holder: Option<HolderRef>,
}

impl EffectState {
    /// Resets the record on detach: identity cleared, order back to 0.
    pub fn clear(&mut self) {
        *self = EffectState::default();
    }

    pub fn is_attached(&self) -> bool {
        self.holder.is_some()
    }
}

/// One effect attachment: the effect's id plus its mutable state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attached {
    pub effect: EffectId,
    pub state: EffectState,
}

impl Attached {
    pub fn new(effect: EffectId, state: EffectState) -> Self {
        Self { effect, state }
    }
}
