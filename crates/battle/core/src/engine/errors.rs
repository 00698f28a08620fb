//! Error types for the dispatch and scheduling pipeline.
//!
//! Game-rule outcomes (null / false / no-effect relays) are not errors and
//! never appear here; they propagate as [`crate::event::RelayValue`]s. What
//! does appear here splits into two tiers: contract violations, which are
//! fatal because silently coercing them would desynchronize deterministic
//! replay, and runaway conditions, which a host harness may catch to abandon
//! one simulation instance without crashing the process.

use crate::effect::EffectId;
use crate::event::EventId;
use crate::state::CombatantId;

/// A broken engine contract. Fatal; never coerced to a default.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ContractError {
    #[error("event {event}: handler of '{effect}' returned {found}, which has no accepted relay conversion for this event")]
    UnconvertibleRelay {
        event: EventId,
        effect: String,
        found: &'static str,
    },

    #[error("event {event} is not registered with a {scope}-scoped alias")]
    MissingEventAlias { event: EventId, scope: &'static str },

    #[error("effect {0:?} is not registered in the content table")]
    UnknownEffect(EffectId),

    #[error("combatant {0:?} is not part of this battle")]
    UnknownCombatant(CombatantId),

    #[error("queue index {index} out of range (queue length {len})")]
    ActionIndexOutOfRange { index: usize, len: usize },

    #[error("{choice} choice could not be resolved: {reason}")]
    UnresolvableChoice {
        choice: &'static str,
        reason: &'static str,
    },

    #[error("battle already started")]
    AlreadyStarted,

    #[error("event {event}: on_effect dispatch requires a source effect")]
    OnEffectWithoutSource { event: EventId },

    #[error("chain_modify called outside an event dispatch")]
    ChainOutsideDispatch,
}

/// A simulation that stopped converging. Distinct and catchable so a host
/// can drop the instance and keep running.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RunawayError {
    #[error("event depth limit reached while dispatching {event} (depth {depth})")]
    EventDepthExceeded { event: EventId, depth: u32 },

    #[error("turn {turn} exceeded the step budget of {budget} actions")]
    StepBudgetExceeded { turn: u32, budget: usize },

    #[error("battle exceeded the turn limit of {0}")]
    TurnLimitExceeded(u32),
}

/// Errors surfaced by engine entry points.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Runaway(#[from] RunawayError),
}

impl EngineError {
    /// True when the error is a non-convergence condition rather than a
    /// broken contract.
    pub fn is_runaway(&self) -> bool {
        matches!(self, EngineError::Runaway(_))
    }
}
