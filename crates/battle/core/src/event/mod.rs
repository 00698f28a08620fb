//! Event identifiers, per-event metadata, and the relay value union.
//!
//! - `EventId` is the closed set of events the engine dispatches.
//! - `EventInfo` is registered metadata consulted on every dispatch;
//!   lookups are exhaustive matches, so metadata can never be silently
//!   missing — bubbling aliases are the one place a lookup can fail, and
//!   that failure is a contract violation at the call site.
//! - `RelayValue` (in [`relay`]) is the ranked result threaded through a
//!   dispatch.

mod listener;
mod relay;

pub use listener::{
    EventListener, Orderable, compare_left_to_right_order, compare_priority,
    compare_redirect_order, speed_sort,
};
pub use relay::RelayValue;

use crate::effect::EffectId;
use crate::state::{CombatantId, HolderRef, StateKey};

/// Every event the engine can dispatch.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "PascalCase", ascii_case_insensitive)]
pub enum EventId {
    // Lifecycle
    Start,
    End,
    SwitchIn,
    SwitchOut,
    Faint,

    // Turn bookkeeping
    BeforeTurn,
    Update,
    Residual,
    SideResidual,
    FieldResidual,
    SideStart,
    FieldStart,
    SideEnd,
    FieldEnd,
    Weather,

    // Scheduling
    ModifyPriority,
    FractionalPriority,
    ModifySpeed,
    ChargeMove,

    // Move resolution
    BeforeMove,
    UseMove,
    AfterMove,
    BasePower,
    ModifyDamage,
    TryHeal,
    SetStatus,

    // Applied to all participants in fixed field order
    Invulnerability,
    TryHit,
    DamagingHit,
    EntryHazard,

    // Redirection competitions
    RedirectTarget,

    // Holder transformations
    FormChange,
    Transform,
}

/// Registered metadata for one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventInfo {
    /// Listener speed is populated from the holder; false for pure
    /// bookkeeping events.
    pub uses_speed: bool,
    /// Listener effect-order is populated from the attached state.
    pub uses_effect_order: bool,
    /// Switch-in-class event: speed gets a fractional adjustment from the
    /// precomputed global speed order.
    pub fractional_speed: bool,
    /// Event also consults side-/field-scoped aliases of itself.
    pub bubbles: bool,
    /// Sorted left to right across field positions instead of by speed.
    pub left_to_right: bool,
    /// A zero integer relay keeps this event alive during spread dispatch.
    pub zero_relay_live: bool,
    /// Event threads a numeric relay; payload kinds with no numeric
    /// conversion are rejected.
    pub numeric: bool,
}

impl EventId {
    /// Metadata for this event. Exhaustive by construction.
    pub fn info(self) -> EventInfo {
        let mut info = EventInfo {
            uses_speed: true,
            uses_effect_order: true,
            fractional_speed: false,
            bubbles: false,
            left_to_right: false,
            zero_relay_live: false,
            numeric: false,
        };
        match self {
            EventId::BeforeTurn | EventId::Update => {
                info.uses_speed = false;
                info.uses_effect_order = false;
            }
            EventId::SwitchIn => info.fractional_speed = true,
            EventId::Residual | EventId::Start | EventId::End => info.bubbles = true,
            EventId::Invulnerability | EventId::TryHit | EventId::EntryHazard => {
                info.left_to_right = true;
            }
            EventId::DamagingHit => {
                info.left_to_right = true;
                info.zero_relay_live = true;
            }
            EventId::ModifyPriority
            | EventId::FractionalPriority
            | EventId::ModifySpeed
            | EventId::BasePower
            | EventId::ModifyDamage => info.numeric = true,
            _ => {}
        }
        info
    }

    /// Side-scoped alias of a bubbling event.
    pub fn side_alias(self) -> Option<EventId> {
        match self {
            EventId::Residual => Some(EventId::SideResidual),
            EventId::Start => Some(EventId::SideStart),
            EventId::End => Some(EventId::SideEnd),
            _ => None,
        }
    }

    /// Field-scoped alias of a bubbling event.
    pub fn field_alias(self) -> Option<EventId> {
        match self {
            EventId::Residual => Some(EventId::FieldResidual),
            EventId::Start => Some(EventId::FieldStart),
            EventId::End => Some(EventId::FieldEnd),
            _ => None,
        }
    }
}

/// Everything a handler may consume about the dispatch it runs inside.
///
/// Handlers receive the context by reference and pick the subset they
/// care about; state mutation goes through [`StateKey`] lookups on the
/// battle, never through aliased borrows.
#[derive(Clone, Debug)]
pub struct EventContext {
    pub event: EventId,
    /// The holder of the effect whose handler is running.
    pub holder: HolderRef,
    /// Current relay value at the moment of invocation.
    pub relay: RelayValue,
    /// Target of the event, when one exists.
    pub target: Option<HolderRef>,
    /// Source combatant of the event, when one exists.
    pub source: Option<CombatantId>,
    /// Effect that caused the event (e.g. the move being used).
    pub source_effect: Option<EffectId>,
    /// Location of the running effect's own state, when attached.
    pub state: Option<StateKey>,
}
