//! Choice resolution and queue scheduling.
//!
//! A committed [`ActionRequest`] becomes one or more canonical [`Action`]
//! records: a move choice may spawn prerequisite siblings (form change,
//! special transform, pre-turn charge) with a fixed relative order ahead
//! of the move itself. Priority and speed are attached here — priority by
//! asking the dispatcher for modifier opinions, speed read fresh from the
//! holder — and the whole queue is sorted once per turn with the same
//! comparator and tie-break machinery handler ordering uses.

use core::cmp::Ordering;

use tracing::debug;

use crate::effect::{EffectId, EffectKind};
use crate::event::{EventId, RelayValue, compare_priority, speed_sort};
use crate::queue::{Action, ActionKind, ActionPayload};
use crate::state::{CombatantId, HolderRef, SideId};

use super::{Battle, ContractError, EngineError};

/// A committed choice, before resolution into canonical actions.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionRequest {
    Move {
        user: CombatantId,
        move_effect: EffectId,
        target: Option<CombatantId>,
        /// Prerequisite form-change rule to apply before the move.
        form_change: Option<EffectId>,
        /// Prerequisite special transformation to apply before the move.
        transform: Option<EffectId>,
    },
    Switch {
        user: CombatantId,
        replacement: CombatantId,
        instant: bool,
    },
    TeamSelect {
        side: SideId,
        order: Vec<u8>,
    },
    Pass,
    Start,
    PreTurn,
    Residual,
    Generic {
        user: CombatantId,
        event: EventId,
    },
}

impl Battle {
    /// Resolves one committed choice into canonical action records.
    ///
    /// `mid_turn` resolution skips prerequisite expansion and the
    /// fractional-priority poll: a mid-turn insertion replaces lost
    /// tempo, it does not re-open the pre-turn window.
    pub fn resolve_action(
        &mut self,
        request: ActionRequest,
        mid_turn: bool,
    ) -> Result<Vec<Action>, EngineError> {
        let mut actions = Vec::new();
        match request {
            ActionRequest::Pass => {}

            ActionRequest::Start => actions.push(Action::new(ActionKind::Start, None)),
            ActionRequest::PreTurn => actions.push(Action::new(ActionKind::PreTurn, None)),
            ActionRequest::Residual => actions.push(Action::new(ActionKind::Residual, None)),

            ActionRequest::TeamSelect { side, order } => {
                let team_len = self.side(side).team.len();
                if order.iter().any(|&index| index as usize >= team_len) {
                    return Err(ContractError::UnresolvableChoice {
                        choice: "team",
                        reason: "selection index out of range",
                    }
                    .into());
                }
                let mut action = Action::new(ActionKind::TeamSelect, None);
                action.payload = ActionPayload::Team { side, order };
                actions.push(action);
            }

            ActionRequest::Generic { user, event } => {
                let mut action = Action::new(ActionKind::Generic, Some(user));
                action.payload = ActionPayload::Event { event };
                actions.push(action);
            }

            ActionRequest::Switch {
                user,
                replacement,
                instant,
            } => {
                let side = self.combatant(user)?.side;
                let incoming = self.combatant(replacement)?;
                if incoming.side != side {
                    return Err(ContractError::UnresolvableChoice {
                        choice: "switch",
                        reason: "replacement belongs to the other side",
                    }
                    .into());
                }
                if incoming.fainted || incoming.active {
                    return Err(ContractError::UnresolvableChoice {
                        choice: "switch",
                        reason: "replacement is not on the bench",
                    }
                    .into());
                }
                let kind = if instant {
                    ActionKind::InstaSwitch
                } else {
                    ActionKind::Switch
                };
                let mut action = Action::new(kind, Some(user));
                action.payload = ActionPayload::Switch { replacement };
                actions.push(action);
            }

            ActionRequest::Move {
                user,
                move_effect,
                target,
                form_change,
                transform,
            } => {
                if !self.combatant(user)?.can_act() {
                    return Err(ContractError::UnresolvableChoice {
                        choice: "move",
                        reason: "user cannot act",
                    }
                    .into());
                }
                let handle = self.effect(move_effect)?;
                if handle.kind() != EffectKind::Move {
                    return Err(ContractError::UnresolvableChoice {
                        choice: "move",
                        reason: "chosen effect is not a move",
                    }
                    .into());
                }

                let mut fractional = 0.0;
                if !mid_turn {
                    // Prerequisite siblings, in their fixed relative order.
                    if let Some(effect) = form_change {
                        self.effect(effect)?;
                        let mut action = Action::new(ActionKind::FormChange, Some(user));
                        action.source_effect = Some(effect);
                        actions.push(action);
                    }
                    if let Some(effect) = transform {
                        self.effect(effect)?;
                        let mut action = Action::new(ActionKind::Transform, Some(user));
                        action.source_effect = Some(effect);
                        actions.push(action);
                    }
                    if handle.handler(EventId::ChargeMove).is_some() {
                        let mut action = Action::new(ActionKind::PreTurnMove, Some(user));
                        action.payload = ActionPayload::Move {
                            effect: move_effect,
                            target,
                        };
                        actions.push(action);
                    }
                    fractional = self
                        .run_event(
                            EventId::FractionalPriority,
                            Some(HolderRef::Combatant(user)),
                            None,
                            Some(move_effect),
                            RelayValue::Decimal(0.0),
                        )?
                        .as_decimal()
                        .unwrap_or(0.0);
                }

                let mut action = Action::new(ActionKind::Move, Some(user));
                action.payload = ActionPayload::Move {
                    effect: move_effect,
                    target,
                };
                action.fractional_priority = fractional;
                actions.push(action);
            }
        }

        for action in &mut actions {
            self.get_action_speed(action)?;
        }
        Ok(actions)
    }

    /// Fills an action's priority and speed.
    ///
    /// Move priority starts from the content-declared base, then takes a
    /// move-scoped `ModifyPriority` opinion, then a holder-scoped one,
    /// and finally adds the tie-break fraction. The integer priority that
    /// other rule checks observe excludes the fraction. Speed is read
    /// from the holder at this moment, never cached across turns.
    pub(crate) fn get_action_speed(&mut self, action: &mut Action) -> Result<(), EngineError> {
        if action.kind == ActionKind::Move {
            if let (Some(user), Some(effect)) = (action.user, action.move_effect()) {
                let base = self.effect(effect)?.base_priority() as i64;
                let mut priority = self
                    .single_event(
                        EventId::ModifyPriority,
                        effect,
                        None,
                        Some(HolderRef::Combatant(user)),
                        Some(user),
                        None,
                        RelayValue::Int(base),
                    )?
                    .as_int()
                    .unwrap_or(base);
                priority = self
                    .run_event(
                        EventId::ModifyPriority,
                        Some(HolderRef::Combatant(user)),
                        None,
                        Some(effect),
                        RelayValue::Int(priority),
                    )?
                    .as_int()
                    .unwrap_or(priority);
                action.priority = priority as f64 + action.fractional_priority;
            }
        }

        if let Some(user) = action.user {
            action.speed = self.action_speed(user)?;
        }
        Ok(())
    }

    /// Resolves a choice and appends its actions at the back of the
    /// queue. Start-of-turn path; ordering comes from the sort that
    /// follows.
    pub fn queue_request(&mut self, request: ActionRequest) -> Result<(), EngineError> {
        let actions = self.resolve_action(request, false)?;
        for action in actions {
            self.queue.push(action);
        }
        Ok(())
    }

    /// Inserts a mid-turn choice ahead of the remaining "rest of turn"
    /// entries.
    ///
    /// The resolved batch is compared against the queued entries with the
    /// canonical comparator and placed strictly before the first entry it
    /// beats; within a comparator-tied span, the exact position is drawn
    /// from the seeded source. Already-queued entries are never
    /// re-sorted.
    pub fn insert_request(&mut self, request: ActionRequest) -> Result<(), EngineError> {
        let actions = self.resolve_action(request, true)?;
        let Some(first_action) = actions.first() else {
            return Ok(());
        };

        let mut first_index = None;
        let mut last_index = None;
        for (i, queued) in self.queue.iter().enumerate() {
            let compared = compare_priority(first_action, queued);
            if compared != Ordering::Greater && first_index.is_none() {
                first_index = Some(i);
            }
            if compared == Ordering::Less {
                last_index = Some(i);
                break;
            }
        }

        match first_index {
            None => {
                for action in actions {
                    self.queue.push(action);
                }
            }
            Some(first) => {
                let last = last_index.unwrap_or(self.queue.len());
                let index = if first == last {
                    first
                } else {
                    self.prng.random_range(first, last + 1)
                };
                debug!(index, "inserting mid-turn actions");
                for (offset, action) in actions.into_iter().enumerate() {
                    self.queue.insert(index + offset, action)?;
                }
            }
        }
        Ok(())
    }

    /// Sorts the whole queue with the canonical comparator, resolving
    /// comparator ties through the seeded source. Start-of-turn only;
    /// mid-turn changes go through [`Battle::insert_request`].
    pub fn sort_queue(&mut self) {
        speed_sort(&mut self.prng, self.queue.as_mut_slice(), compare_priority);
    }

    /// Pulls the queued action at `index` to the front of the queue with
    /// the instant-switch order, so it executes before everything still
    /// pending this turn.
    pub fn prioritize_action(
        &mut self,
        index: usize,
        source_effect: Option<EffectId>,
    ) -> Result<(), EngineError> {
        let len = self.queue.len();
        if index >= len {
            return Err(ContractError::ActionIndexOutOfRange { index, len }.into());
        }
        let mut action = self.queue.list_mut().remove(index);
        if source_effect.is_some() {
            action.source_effect = source_effect;
        }
        action.order = ActionKind::InstaSwitch.base_order();
        self.queue.unshift(action);
        Ok(())
    }

    /// Replaces a combatant's queued actions with a new choice.
    pub fn change_action(
        &mut self,
        combatant: CombatantId,
        request: ActionRequest,
    ) -> Result<(), EngineError> {
        self.queue.cancel_actions(combatant);
        self.queue_request(request)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::ActionRequest;
    use crate::effect::{ContentTable, EffectId, EffectKind};
    use crate::event::{EventId, RelayValue};
    use crate::queue::ActionKind;
    use crate::state::SideId;
    use crate::testutil::{TestEffect, duel};

    fn strike(id: u32, priority: i32) -> TestEffect {
        TestEffect::new(id, "strike", EffectKind::Move).with_base_priority(priority)
    }

    #[test]
    fn move_priority_takes_scoped_then_general_opinions() {
        let mut content = ContentTable::new();
        // The move itself pins its priority to 3 in the scoped event.
        content.register(Arc::new(
            strike(10, 0).with_const(EventId::ModifyPriority, RelayValue::Int(3)),
        ));
        // A holder-scoped ability adds one on top.
        content.register(Arc::new(
            TestEffect::new(20, "trickster", EffectKind::Ability).with_callback(
                EventId::ModifyPriority,
                |_battle, ctx| {
                    let current = ctx.relay.as_int().unwrap_or(0);
                    Ok(RelayValue::Int(current + 1))
                },
            ),
        ));
        let (mut battle, a, _b) = duel(1, content, 100, 100);
        battle.set_ability(a, EffectId(20)).unwrap();
        battle.start().unwrap();

        let actions = battle
            .resolve_action(
                ActionRequest::Move {
                    user: a,
                    move_effect: EffectId(10),
                    target: None,
                    form_change: None,
                    transform: None,
                },
                false,
            )
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].priority, 4.0);
        assert_eq!(actions[0].speed, 100.0);
    }

    #[test]
    fn fractional_priority_separates_without_changing_the_integer() {
        let mut content = ContentTable::new();
        content.register(Arc::new(strike(10, 1)));
        content.register(Arc::new(
            TestEffect::new(20, "gale", EffectKind::Ability)
                .with_const(EventId::FractionalPriority, RelayValue::Decimal(0.5)),
        ));
        let (mut battle, a, _b) = duel(1, content, 100, 100);
        battle.set_ability(a, EffectId(20)).unwrap();
        battle.start().unwrap();

        let actions = battle
            .resolve_action(
                ActionRequest::Move {
                    user: a,
                    move_effect: EffectId(10),
                    target: None,
                    form_change: None,
                    transform: None,
                },
                false,
            )
            .unwrap();
        assert_eq!(actions[0].fractional_priority, 0.5);
        assert_eq!(actions[0].priority, 1.5);
    }

    #[test]
    fn move_choice_expands_prerequisites_in_fixed_relative_order() {
        let mut content = ContentTable::new();
        content.register(Arc::new(
            strike(10, 0).with_callback(EventId::ChargeMove, |_b, _c| {
                Ok(RelayValue::NoOpinion)
            }),
        ));
        content.register(Arc::new(TestEffect::new(
            30,
            "unmask",
            EffectKind::Condition,
        )));
        let (mut battle, a, _b) = duel(1, content, 100, 100);
        battle.start().unwrap();

        let actions = battle
            .resolve_action(
                ActionRequest::Move {
                    user: a,
                    move_effect: EffectId(10),
                    target: None,
                    form_change: Some(EffectId(30)),
                    transform: None,
                },
                false,
            )
            .unwrap();
        let kinds: Vec<ActionKind> = actions.iter().map(|action| action.kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::FormChange, ActionKind::PreTurnMove, ActionKind::Move]
        );
        // Prerequisites execute before the move because their base order
        // is strictly smaller.
        assert!(actions[0].order < actions[2].order);
        assert!(actions[1].order < actions[2].order);
    }

    #[test]
    fn mid_turn_resolution_skips_prerequisites() {
        let mut content = ContentTable::new();
        content.register(Arc::new(
            strike(10, 0).with_callback(EventId::ChargeMove, |_b, _c| {
                Ok(RelayValue::NoOpinion)
            }),
        ));
        let (mut battle, a, _b) = duel(1, content, 100, 100);
        battle.start().unwrap();

        let actions = battle
            .resolve_action(
                ActionRequest::Move {
                    user: a,
                    move_effect: EffectId(10),
                    target: None,
                    form_change: None,
                    transform: None,
                },
                true,
            )
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Move);
    }

    #[test]
    fn mid_turn_insert_lands_before_rest_of_turn() {
        let mut content = ContentTable::new();
        content.register(Arc::new(strike(10, 0)));
        let (mut battle, a, b) = duel(1, content, 100, 90);
        let bench = battle.register_combatant(SideId(0), "charlie", 70, 100);
        battle.start().unwrap();

        battle
            .queue_request(ActionRequest::Move {
                user: a,
                move_effect: EffectId(10),
                target: Some(b),
                form_change: None,
                transform: None,
            })
            .unwrap();
        battle
            .queue_request(ActionRequest::Move {
                user: b,
                move_effect: EffectId(10),
                target: Some(a),
                form_change: None,
                transform: None,
            })
            .unwrap();
        battle.queue_request(ActionRequest::Residual).unwrap();
        battle.sort_queue();

        battle
            .insert_request(ActionRequest::Switch {
                user: a,
                replacement: bench,
                instant: true,
            })
            .unwrap();

        let kinds: Vec<ActionKind> = battle.queue().iter().map(|action| action.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::InstaSwitch,
                ActionKind::Move,
                ActionKind::Move,
                ActionKind::Residual
            ]
        );
        // The already-queued rest of the turn kept its relative order.
        let users: Vec<_> = battle
            .queue()
            .iter()
            .filter(|action| action.kind == ActionKind::Move)
            .map(|action| action.user)
            .collect();
        assert_eq!(users, vec![Some(a), Some(b)]);
    }

    #[test]
    fn prioritize_action_pins_to_front_with_switch_order() {
        let mut content = ContentTable::new();
        content.register(Arc::new(strike(10, 0)));
        let (mut battle, a, b) = duel(1, content, 100, 90);
        battle.start().unwrap();

        battle
            .queue_request(ActionRequest::Move {
                user: a,
                move_effect: EffectId(10),
                target: None,
                form_change: None,
                transform: None,
            })
            .unwrap();
        battle
            .queue_request(ActionRequest::Move {
                user: b,
                move_effect: EffectId(10),
                target: None,
                form_change: None,
                transform: None,
            })
            .unwrap();
        battle.sort_queue();

        // The slower action jumps the queue.
        battle.prioritize_action(1, None).unwrap();
        let front = battle.queue().peek().unwrap();
        assert_eq!(front.user, Some(b));
        assert_eq!(front.order, ActionKind::InstaSwitch.base_order());

        // Out-of-range indexes are contract violations, not clamps.
        assert!(battle.prioritize_action(10, None).is_err());
    }

    #[test]
    fn switch_to_unavailable_replacement_is_rejected() {
        let content = ContentTable::new();
        let (mut battle, a, b) = duel(1, content, 100, 90);
        battle.start().unwrap();

        // The foe is on the other side; switching to it is incoherent.
        let err = battle
            .resolve_action(
                ActionRequest::Switch {
                    user: a,
                    replacement: b,
                    instant: false,
                },
                false,
            )
            .unwrap_err();
        assert!(!err.is_runaway());
    }

    #[test]
    fn queue_probes_see_pending_actions() {
        let mut content = ContentTable::new();
        content.register(Arc::new(strike(10, 0)));
        let (mut battle, a, b) = duel(1, content, 100, 90);
        battle.start().unwrap();

        battle
            .queue_request(ActionRequest::Move {
                user: a,
                move_effect: EffectId(10),
                target: Some(b),
                form_change: None,
                transform: None,
            })
            .unwrap();
        battle.queue_request(ActionRequest::Residual).unwrap();
        battle.sort_queue();

        assert_eq!(battle.queue().will_act().map(|action| action.user), Some(Some(a)));
        assert!(battle.queue().will_move(a).is_some());
        assert!(battle.queue().will_switch(a).is_none());
        assert_eq!(
            battle.queue().peek_back().map(|action| action.kind),
            Some(ActionKind::Residual)
        );
    }

    #[test]
    fn change_action_replaces_a_queued_choice() {
        let mut content = ContentTable::new();
        content.register(Arc::new(strike(10, 0)));
        content.register(Arc::new(strike(11, 0)));
        let (mut battle, a, b) = duel(1, content, 100, 90);
        battle.start().unwrap();

        battle
            .queue_request(ActionRequest::Move {
                user: a,
                move_effect: EffectId(10),
                target: Some(b),
                form_change: None,
                transform: None,
            })
            .unwrap();
        battle
            .change_action(
                a,
                ActionRequest::Move {
                    user: a,
                    move_effect: EffectId(11),
                    target: Some(b),
                    form_change: None,
                    transform: None,
                },
            )
            .unwrap();

        let moves: Vec<_> = battle
            .queue()
            .iter()
            .filter(|action| action.kind == ActionKind::Move)
            .collect();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].move_effect(), Some(EffectId(11)));
    }
}
