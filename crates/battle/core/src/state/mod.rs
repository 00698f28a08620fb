//! Per-instance battle state: holders and attached effect states.
//!
//! Everything here is plain mutable data owned by one battle instance.
//! Effects themselves live in the shared read-only content table; this
//! module owns the *attachments* — which effect is bound to which holder,
//! with which [`EffectState`].

mod combatant;
mod effect_state;
mod field;
mod side;

pub use combatant::{Combatant, CombatantId};
pub use effect_state::{Attached, EffectState, HolderKind, HolderRef, StateKey};
pub use field::Field;
pub use side::{Side, SideId};
