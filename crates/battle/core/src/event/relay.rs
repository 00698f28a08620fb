//! The ranked result value threaded through one event dispatch.

use crate::effect::EffectId;

/// One handler's opinion about an in-flight event.
///
/// Game-rule outcomes are values here, never errors: `Null` is silent
/// suppression, `Bool(false)` is an ordinary failure, `Int`/`Decimal`
/// carry amounts, and `NoOpinion` leaves the previous relay untouched.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelayValue {
    /// No handler has weighed in yet / this handler declines to.
    NoOpinion,
    /// Explicit suppression without a message.
    Null,
    Bool(bool),
    Int(i64),
    Decimal(f64),
    /// Domain payload: a message token.
    Text(String),
    /// Domain payload: a reference to an effect (e.g. a forced move).
    Effect(EffectId),
}

impl RelayValue {
    /// Dominance rank used by [`RelayValue::combine`]. Higher ranks carry
    /// more information and win when two fan-out results merge.
    fn rank(&self) -> u8 {
        match self {
            RelayValue::NoOpinion => 0,
            RelayValue::Text(_) | RelayValue::Effect(_) => 1,
            RelayValue::Null => 2,
            RelayValue::Bool(_) => 3,
            RelayValue::Int(_) | RelayValue::Decimal(_) => 4,
        }
    }

    /// Truthiness drives early exit: a falsy relay suppresses the rest of
    /// the dispatch chain.
    pub fn is_truthy(&self) -> bool {
        match self {
            RelayValue::NoOpinion => true,
            RelayValue::Null => false,
            RelayValue::Bool(value) => *value,
            RelayValue::Int(value) => *value != 0,
            RelayValue::Decimal(value) => *value != 0.0,
            RelayValue::Text(value) => !value.is_empty(),
            RelayValue::Effect(_) => true,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, RelayValue::Int(0)) || matches!(self, RelayValue::Decimal(v) if *v == 0.0)
    }

    /// Payload kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RelayValue::NoOpinion => "no-opinion",
            RelayValue::Null => "null",
            RelayValue::Bool(_) => "bool",
            RelayValue::Int(_) => "int",
            RelayValue::Decimal(_) => "decimal",
            RelayValue::Text(_) => "text",
            RelayValue::Effect(_) => "effect",
        }
    }

    /// True when the payload has a numeric reading.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            RelayValue::NoOpinion
                | RelayValue::Null
                | RelayValue::Bool(_)
                | RelayValue::Int(_)
                | RelayValue::Decimal(_)
        )
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            RelayValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            RelayValue::Int(value) => Some(*value as f64),
            RelayValue::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    /// Replaces `current` unless this is a non-opinion.
    pub fn or_keep(self, current: RelayValue) -> RelayValue {
        match self {
            RelayValue::NoOpinion => current,
            value => value,
        }
    }

    /// Merges two results from a dispatch that fanned out across targets.
    ///
    /// Rank table: numbers dominate booleans, booleans dominate null,
    /// null dominates domain payloads, and everything dominates
    /// no-opinion. A truthy left survives a falsy (but nonzero) right,
    /// and same-kind numeric results sum.
    pub fn combine(self, other: RelayValue) -> RelayValue {
        if self.rank() > other.rank() {
            return self;
        }
        if self.is_truthy() && !other.is_truthy() && !other.is_zero() {
            return self;
        }
        match (self, other) {
            (RelayValue::Int(a), RelayValue::Int(b)) => RelayValue::Int(a + b),
            (RelayValue::Decimal(a), RelayValue::Decimal(b)) => RelayValue::Decimal(a + b),
            (_, other) => other,
        }
    }
}

impl From<bool> for RelayValue {
    fn from(value: bool) -> Self {
        RelayValue::Bool(value)
    }
}

impl From<i64> for RelayValue {
    fn from(value: i64) -> Self {
        RelayValue::Int(value)
    }
}

impl From<f64> for RelayValue {
    fn from(value: f64) -> Self {
        RelayValue::Decimal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_dominate_weaker_kinds() {
        assert_eq!(
            RelayValue::Int(40).combine(RelayValue::Bool(false)),
            RelayValue::Int(40)
        );
        assert_eq!(
            RelayValue::Bool(true).combine(RelayValue::Int(12)),
            RelayValue::Int(12)
        );
        assert_eq!(
            RelayValue::NoOpinion.combine(RelayValue::Null),
            RelayValue::Null
        );
    }

    #[test]
    fn same_kind_numbers_sum() {
        assert_eq!(
            RelayValue::Int(40).combine(RelayValue::Int(2)),
            RelayValue::Int(42)
        );
        assert_eq!(
            RelayValue::Decimal(0.5).combine(RelayValue::Decimal(0.25)),
            RelayValue::Decimal(0.75)
        );
    }

    #[test]
    fn truthy_left_survives_falsy_nonzero_right() {
        assert_eq!(
            RelayValue::Bool(true).combine(RelayValue::Bool(false)),
            RelayValue::Bool(true)
        );
        // Zero is live: it replaces rather than being dropped.
        assert_eq!(
            RelayValue::Int(5).combine(RelayValue::Int(0)),
            RelayValue::Int(5)
        );
    }

    #[test]
    fn no_opinion_keeps_previous_relay() {
        assert_eq!(
            RelayValue::NoOpinion.or_keep(RelayValue::Int(7)),
            RelayValue::Int(7)
        );
        assert_eq!(
            RelayValue::Bool(false).or_keep(RelayValue::Int(7)),
            RelayValue::Bool(false)
        );
    }
}
