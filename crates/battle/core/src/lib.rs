//! Deterministic event dispatch and turn scheduling for simultaneous
//! hidden-choice adversarial simulations.
//!
//! `battle-core` is the engine underneath a rule-content layer it never
//! sees: effects (abilities, items, conditions, rules, moves) are opaque
//! objects exposing a handler lookup and ordering overrides. The crate
//! provides ordered dispatch ([`engine::Battle::run_event`] and friends),
//! a schedulable action queue, seeded tie-break resolution, and the
//! fixed-point modifier arithmetic shared with damage formulas. Given the
//! same seed and the same committed choices, every dispatch order,
//! tie-break shuffle, and queue order is bit-for-bit reproducible.
pub mod config;
pub mod effect;
pub mod engine;
pub mod event;
pub mod modifier;
pub mod prng;
pub mod queue;
pub mod state;

pub use config::EngineConfig;
pub use effect::{
    ContentTable, Effect, EffectFlags, EffectId, EffectKind, Handler, HandlerOrdering,
};
pub use engine::{
    ActionRequest, Battle, ContractError, EngineError, RunawayError, TurnOutcome,
};
pub use event::{
    EventContext, EventId, EventListener, Orderable, RelayValue, compare_left_to_right_order,
    compare_priority, compare_redirect_order, speed_sort,
};
pub use modifier::{Factor, ModifierChain, chain, modify, trunc};
pub use prng::Prng;
pub use queue::{Action, ActionKind, ActionPayload, ActionQueue};
pub use state::{
    Attached, Combatant, CombatantId, EffectState, Field, HolderKind, HolderRef, Side, SideId,
    StateKey,
};

#[cfg(test)]
pub(crate) mod testutil;
