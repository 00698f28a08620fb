//! Rule-bearing effects and the shared content table.
//!
//! An [`Effect`] is anything that can register event handlers: an ability,
//! a held item, a volatile/side/field condition, a format rule, or an
//! in-progress move. The engine treats effects as opaque except for three
//! capabilities: a handler lookup per event, optional ordering overrides
//! for that handler, and a small set of capability flags.
//!
//! Handler shapes form a closed set decided once at registration and
//! dispatched via pattern matching; there is no runtime signature
//! inspection.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{Battle, ContractError, EngineError};
use crate::event::{EventContext, EventId, RelayValue};

/// Stable identity of an effect within the content table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectId(pub u32);

impl core::fmt::Display for EffectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Broad classification of an effect. Together with the holder
/// classification this drives default handler sub-orders.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EffectKind {
    /// Innate ability of a combatant.
    Ability,
    /// Held item.
    Item,
    /// Status, volatile, side, slot, or field condition.
    Condition,
    /// Field-wide weather.
    Weather,
    /// Field-wide terrain.
    Terrain,
    /// The active format.
    Format,
    /// A rule attached by the format.
    Rule,
    /// A move being executed.
    Move,
}

bitflags::bitflags! {
    /// Generic capabilities the engine needs to see without knowing the
    /// concrete rule behind them.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct EffectFlags: u8 {
        /// Handler may be suppressed by ability-breaking effects.
        const BREAKABLE = 1 << 0;
        /// Reflection-type ability: reads the holder's unmodified speed
        /// when competing to bounce side-targeted events.
        const REFLECTING = 1 << 1;
        /// Field effect that reverses action-speed order while active.
        const INVERTS_SPEED = 1 << 2;
    }
}

/// Explicit ordering overrides an effect may declare for one handler.
///
/// Missing values fall back to the defaults computed by the priority
/// resolver: unordered (sorts last), priority 0, and a sub-order derived
/// from the effect kind and holder classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandlerOrdering {
    pub order: Option<u32>,
    pub priority: Option<i32>,
    pub sub_order: Option<u32>,
}

impl HandlerOrdering {
    pub fn priority(priority: i32) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    pub fn sub_order(sub_order: u32) -> Self {
        Self {
            sub_order: Some(sub_order),
            ..Self::default()
        }
    }
}

/// The closed set of handler shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum Handler {
    /// A constant result; the effect is not invoked.
    Const(RelayValue),
    /// Invoked; its return value becomes the relay opinion.
    Callback,
    /// Invoked for bookkeeping only; returning anything other than
    /// no-opinion is a contract violation.
    Notify,
}

/// A rule-bearing entity, opaque to the engine.
///
/// Implementations live in the content layer (or in tests) and are shared
/// read-only across battle instances via [`ContentTable`].
pub trait Effect: Send + Sync {
    fn id(&self) -> EffectId;

    fn name(&self) -> &str;

    fn kind(&self) -> EffectKind;

    fn flags(&self) -> EffectFlags {
        EffectFlags::empty()
    }

    /// Handler shape for `event`, or `None` when this effect does not
    /// listen to it.
    fn handler(&self, event: EventId) -> Option<Handler>;

    /// Ordering overrides for this effect's `event` handler.
    fn ordering(&self, _event: EventId) -> HandlerOrdering {
        HandlerOrdering::default()
    }

    /// Default duration, in turns, of a freshly attached state.
    fn duration(&self) -> Option<u16> {
        None
    }

    /// Base scheduling priority; meaningful for `Move` effects.
    fn base_priority(&self) -> i32 {
        0
    }

    /// Runs the handler for `ctx.event`. Only called for `Callback` and
    /// `Notify` shapes.
    fn invoke(&self, battle: &mut Battle, ctx: &EventContext) -> Result<RelayValue, EngineError> {
        let _ = (battle, ctx);
        Ok(RelayValue::NoOpinion)
    }
}

/// Shared, read-only table of all effects a battle may reference.
///
/// Built once by the content layer and shared across instances; battles
/// only ever look effects up by id.
#[derive(Clone, Default)]
pub struct ContentTable {
    effects: HashMap<EffectId, Arc<dyn Effect>>,
}

impl ContentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an effect under its own id. Re-registering an id replaces
    /// the previous entry.
    pub fn register(&mut self, effect: Arc<dyn Effect>) -> &mut Self {
        self.effects.insert(effect.id(), effect);
        self
    }

    /// Looks an effect up, failing with a contract violation for ids the
    /// table has never seen.
    pub fn get(&self, id: EffectId) -> Result<&Arc<dyn Effect>, ContractError> {
        self.effects.get(&id).ok_or(ContractError::UnknownEffect(id))
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.effects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl core::fmt::Debug for ContentTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContentTable")
            .field("effects", &self.effects.len())
            .finish()
    }
}
