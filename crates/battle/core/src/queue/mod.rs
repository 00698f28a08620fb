//! The turn's action queue: canonical action records and queue operations.
//!
//! Committed choices resolve into [`Action`]s (see the scheduling methods
//! on `Battle`); the queue itself is a plain ordered list with the
//! operations the turn loop needs. Sorting is done by the battle, which
//! owns the seeded source the comparator ties are resolved with.

use crate::effect::EffectId;
use crate::event::{EventId, Orderable};
use crate::state::{CombatantId, SideId};

/// Kind of a queued action. The base-order table fixes the coarse phase
/// each kind executes in; priority and speed order entries within a phase.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionKind {
    /// Team-order selection before the battle proper.
    TeamSelect,
    /// Start-of-battle bookkeeping (leads enter the field).
    Start,
    /// Mid-turn replacement switch; jumps ahead of the rest of the turn.
    InstaSwitch,
    /// Pre-turn hook sweep.
    PreTurn,
    /// A move's pre-turn charge declaration.
    PreTurnMove,
    /// Voluntary switch.
    Switch,
    /// Prerequisite form change spawned by a move choice.
    FormChange,
    /// Prerequisite special transformation spawned by a move choice.
    Transform,
    /// A move execution.
    Move,
    /// Content-driven event action.
    Generic,
    /// End-of-turn residual sweep.
    Residual,
    /// Explicit no-op choice; resolves to nothing.
    Pass,
}

impl ActionKind {
    /// Base order within a turn, low to high. Kinds sharing a value are
    /// separated by priority, speed, and the seeded tie-break.
    pub fn base_order(self) -> u32 {
        match self {
            ActionKind::TeamSelect => 1,
            ActionKind::Start => 2,
            ActionKind::InstaSwitch => 3,
            ActionKind::PreTurn => 4,
            ActionKind::PreTurnMove => 5,
            ActionKind::Switch => 103,
            ActionKind::FormChange => 104,
            ActionKind::Transform => 106,
            ActionKind::Move | ActionKind::Generic | ActionKind::Pass => 200,
            ActionKind::Residual => 300,
        }
    }
}

/// Kind-specific payload of an action.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionPayload {
    None,
    Move {
        effect: EffectId,
        target: Option<CombatantId>,
    },
    Switch {
        replacement: CombatantId,
    },
    Team {
        side: SideId,
        order: Vec<u8>,
    },
    Event {
        event: EventId,
    },
}

/// One queued, schedulable unit of turn execution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Action {
    pub kind: ActionKind,
    pub order: u32,
    /// Resolved priority: integer base plus modifier opinions plus the
    /// tie-break fraction.
    pub priority: f64,
    /// The tie-break fraction alone; the integer part other rule checks
    /// observe excludes it.
    pub fractional_priority: f64,
    /// Action speed of the user, read at resolution time.
    pub speed: f64,
    pub user: Option<CombatantId>,
    pub payload: ActionPayload,
    pub source_effect: Option<EffectId>,
}

impl Action {
    pub fn new(kind: ActionKind, user: Option<CombatantId>) -> Self {
        Self {
            kind,
            order: kind.base_order(),
            priority: 0.0,
            fractional_priority: 0.0,
            speed: 1.0,
            user,
            payload: ActionPayload::None,
            source_effect: None,
        }
    }

    /// The move this action executes, if it is a move action.
    pub fn move_effect(&self) -> Option<EffectId> {
        match &self.payload {
            ActionPayload::Move { effect, .. } => Some(*effect),
            _ => None,
        }
    }
}

impl Orderable for Action {
    fn order(&self) -> Option<u32> {
        Some(self.order)
    }

    fn priority(&self) -> f64 {
        self.priority
    }

    fn speed(&self) -> f64 {
        self.speed
    }

    fn sub_order(&self) -> u32 {
        0
    }

    fn effect_order(&self) -> u64 {
        0
    }
}

/// The queue itself: an ordered list of resolved actions.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionQueue {
    list: Vec<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Appends an action at the back.
    pub fn push(&mut self, action: Action) {
        self.list.push(action);
    }

    /// Inserts an action at the front.
    pub fn unshift(&mut self, action: Action) {
        self.list.insert(0, action);
    }

    /// Inserts at an explicit position. An out-of-range index is a broken
    /// contract, not a clamp.
    pub fn insert(
        &mut self,
        index: usize,
        action: Action,
    ) -> Result<(), crate::engine::ContractError> {
        if index > self.list.len() {
            return Err(crate::engine::ContractError::ActionIndexOutOfRange {
                index,
                len: self.list.len(),
            });
        }
        self.list.insert(index, action);
        Ok(())
    }

    /// Next action to execute, without removing it.
    pub fn peek(&self) -> Option<&Action> {
        self.list.first()
    }

    /// Last queued action, without removing it.
    pub fn peek_back(&self) -> Option<&Action> {
        self.list.last()
    }

    /// Removes and returns the front action.
    pub fn shift(&mut self) -> Option<Action> {
        if self.list.is_empty() {
            return None;
        }
        Some(self.list.remove(0))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.list.iter()
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Action] {
        &mut self.list
    }

    pub(crate) fn list_mut(&mut self) -> &mut Vec<Action> {
        &mut self.list
    }

    /// The next move/switch in the queue, i.e. the action whose turn it
    /// would be.
    pub fn will_act(&self) -> Option<&Action> {
        self.list.iter().find(|action| {
            matches!(
                action.kind,
                ActionKind::Move | ActionKind::Switch | ActionKind::InstaSwitch
            )
        })
    }

    /// The queued move action of one combatant, if any.
    pub fn will_move(&self, combatant: CombatantId) -> Option<&Action> {
        self.list
            .iter()
            .find(|action| action.kind == ActionKind::Move && action.user == Some(combatant))
    }

    /// The queued switch action of one combatant, if any.
    pub fn will_switch(&self, combatant: CombatantId) -> Option<&Action> {
        self.list.iter().find(|action| {
            matches!(action.kind, ActionKind::Switch | ActionKind::InstaSwitch)
                && action.user == Some(combatant)
        })
    }

    /// Removes every queued move and switch of one combatant (e.g. a
    /// forced-out holder loses its queued move). Returns true if
    /// anything was removed.
    pub fn cancel_actions(&mut self, combatant: CombatantId) -> bool {
        let before = self.list.len();
        self.list.retain(|action| {
            !(action.user == Some(combatant)
                && matches!(
                    action.kind,
                    ActionKind::Move | ActionKind::Switch | ActionKind::InstaSwitch
                ))
        });
        self.list.len() != before
    }

    /// Removes the first queued move of one combatant. Returns true if a
    /// move was removed.
    pub fn cancel_move(&mut self, combatant: CombatantId) -> bool {
        let index = self
            .list
            .iter()
            .position(|action| action.kind == ActionKind::Move && action.user == Some(combatant));
        match index {
            Some(index) => {
                self.list.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(kind: ActionKind, user: u32) -> Action {
        Action::new(kind, Some(CombatantId(user)))
    }

    #[test]
    fn base_order_table_is_monotone_across_phases() {
        let phases = [
            ActionKind::TeamSelect,
            ActionKind::Start,
            ActionKind::InstaSwitch,
            ActionKind::PreTurn,
            ActionKind::PreTurnMove,
            ActionKind::Switch,
            ActionKind::FormChange,
            ActionKind::Transform,
            ActionKind::Move,
            ActionKind::Residual,
        ];
        for pair in phases.windows(2) {
            assert!(pair[0].base_order() <= pair[1].base_order());
        }
    }

    #[test]
    fn queue_ops() {
        let mut queue = ActionQueue::new();
        queue.push(action(ActionKind::Move, 1));
        queue.push(action(ActionKind::Move, 2));
        queue.unshift(action(ActionKind::Switch, 3));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().unwrap().user, Some(CombatantId(3)));
        assert_eq!(queue.peek_back().unwrap().user, Some(CombatantId(2)));

        let front = queue.shift().unwrap();
        assert_eq!(front.kind, ActionKind::Switch);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn insert_out_of_range_is_rejected() {
        let mut queue = ActionQueue::new();
        queue.push(action(ActionKind::Move, 1));
        let result = queue.insert(5, action(ActionKind::Move, 2));
        assert!(result.is_err());
    }

    #[test]
    fn cancel_removes_only_the_target() {
        let mut queue = ActionQueue::new();
        queue.push(action(ActionKind::Move, 1));
        queue.push(action(ActionKind::Move, 2));
        queue.push(Action::new(ActionKind::Residual, None));

        assert!(queue.cancel_actions(CombatantId(1)));
        assert!(queue.will_move(CombatantId(1)).is_none());
        assert!(queue.will_move(CombatantId(2)).is_some());
        // Field actions never belong to a combatant and are untouched.
        assert_eq!(queue.len(), 2);
        assert!(!queue.cancel_move(CombatantId(1)));
    }
}
