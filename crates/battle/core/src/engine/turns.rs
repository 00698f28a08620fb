//! The turn loop: serving actions, switches, faints, and win detection.
//!
//! One turn is: commit choices → resolve into the queue → bracket with
//! the pre-turn and residual sweeps → sort once → serve actions one at a
//! time. Serving an action calls back into the dispatcher for every
//! sub-decision. The loop pauses (rather than blocks) when a fainted
//! combatant needs a replacement, returning control to the host.

use tracing::debug;

use crate::config::EngineConfig;
use crate::event::{EventId, RelayValue};
use crate::queue::{Action, ActionKind, ActionPayload};
use crate::state::{Attached, CombatantId, HolderRef, SideId, StateKey};

use super::schedule::ActionRequest;
use super::{Battle, ContractError, EngineError, RunawayError};

/// Where a turn-loop entry point left the simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Turn complete; awaiting the next round of choices.
    Continue,
    /// Mid-turn pause: these fainted combatants need replacements via
    /// [`Battle::resume_with_switches`].
    AwaitSwitch(Vec<CombatantId>),
    /// The battle is over.
    Ended { winner: Option<SideId> },
}

impl Battle {
    /// Starts the battle: leads enter the field and switch-in effects
    /// fire in speed order.
    pub fn start(&mut self) -> Result<TurnOutcome, EngineError> {
        if self.started {
            return Err(ContractError::AlreadyStarted.into());
        }
        self.started = true;
        self.queue_request(ActionRequest::Start)?;
        self.sort_queue();
        self.run_queue()
    }

    /// Commits one round of simultaneous hidden choices and runs the
    /// turn.
    pub fn commit_choices(
        &mut self,
        requests: Vec<ActionRequest>,
    ) -> Result<TurnOutcome, EngineError> {
        if self.ended {
            return Ok(TurnOutcome::Ended {
                winner: self.winner,
            });
        }
        if self.turn >= self.config.max_turns {
            return Err(RunawayError::TurnLimitExceeded(self.config.max_turns).into());
        }

        for request in requests {
            self.queue_request(request)?;
        }
        self.queue_request(ActionRequest::PreTurn)?;
        self.queue_request(ActionRequest::Residual)?;
        self.sort_queue();
        self.run_queue()
    }

    /// Continues a paused turn with replacement switches. The requests
    /// are inserted mid-turn, ahead of the remaining rest-of-turn
    /// entries.
    pub fn resume_with_switches(
        &mut self,
        requests: Vec<ActionRequest>,
    ) -> Result<TurnOutcome, EngineError> {
        for request in requests {
            self.insert_request(request)?;
        }
        self.run_queue()
    }

    // ========================================================================
    // The loop
    // ========================================================================

    fn run_queue(&mut self) -> Result<TurnOutcome, EngineError> {
        let mut steps = 0usize;
        while let Some(action) = self.queue.shift() {
            steps += 1;
            if steps > EngineConfig::MAX_TURN_STEPS {
                return Err(RunawayError::StepBudgetExceeded {
                    turn: self.turn,
                    budget: EngineConfig::MAX_TURN_STEPS,
                }
                .into());
            }

            self.run_action(action)?;

            if self.ended {
                self.queue.clear();
                return Ok(TurnOutcome::Ended {
                    winner: self.winner,
                });
            }
            if !self.needs_switch.is_empty() {
                let pending = self.pending_replacements();
                if !pending.is_empty() {
                    return Ok(TurnOutcome::AwaitSwitch(pending));
                }
            }
        }

        self.turn += 1;
        self.update_speed_order();
        Ok(TurnOutcome::Continue)
    }

    fn run_action(&mut self, action: Action) -> Result<(), EngineError> {
        debug!(kind = %action.kind, user = ?action.user, "serving action");
        match action.kind {
            ActionKind::Start => self.run_battle_start()?,

            ActionKind::TeamSelect => {
                if let ActionPayload::Team { side, order } = &action.payload {
                    self.apply_team_order(*side, order);
                }
            }

            ActionKind::Switch | ActionKind::InstaSwitch => {
                if let (Some(user), ActionPayload::Switch { replacement }) =
                    (action.user, &action.payload)
                {
                    self.perform_switch(user, *replacement, action.source_effect)?;
                }
            }

            ActionKind::FormChange => {
                if let (Some(user), Some(effect)) = (action.user, action.source_effect) {
                    self.single_event(
                        EventId::FormChange,
                        effect,
                        None,
                        Some(HolderRef::Combatant(user)),
                        Some(user),
                        None,
                        RelayValue::NoOpinion,
                    )?;
                }
            }

            ActionKind::Transform => {
                if let (Some(user), Some(effect)) = (action.user, action.source_effect) {
                    self.single_event(
                        EventId::Transform,
                        effect,
                        None,
                        Some(HolderRef::Combatant(user)),
                        Some(user),
                        None,
                        RelayValue::NoOpinion,
                    )?;
                }
            }

            ActionKind::PreTurn => self.each_event(EventId::BeforeTurn, None)?,

            ActionKind::PreTurnMove => {
                if let (Some(user), Some(effect)) = (action.user, action.move_effect()) {
                    self.single_event(
                        EventId::ChargeMove,
                        effect,
                        None,
                        Some(HolderRef::Combatant(user)),
                        Some(user),
                        None,
                        RelayValue::NoOpinion,
                    )?;
                }
            }

            ActionKind::Move => self.run_move(&action)?,

            ActionKind::Generic => {
                if let ActionPayload::Event { event } = action.payload {
                    self.run_event(
                        event,
                        action.user.map(HolderRef::Combatant),
                        None,
                        action.source_effect,
                        RelayValue::NoOpinion,
                    )?;
                }
            }

            ActionKind::Residual => {
                self.update_speed_order();
                self.field_event(EventId::Residual, None)?;
            }

            ActionKind::Pass => {}
        }

        self.resolve_faints()?;
        self.check_win();
        Ok(())
    }

    // ========================================================================
    // Action bodies
    // ========================================================================

    fn run_battle_start(&mut self) -> Result<(), EngineError> {
        for side_index in 0..EngineConfig::SIDES {
            let side_id = SideId(side_index as u8);
            let leads: Vec<CombatantId> = self
                .side(side_id)
                .team
                .iter()
                .copied()
                .take(self.config.active_per_side)
                .collect();
            for (slot, id) in leads.into_iter().enumerate() {
                self.place_active(side_id, slot as u8, id)?;
            }
        }
        self.update_speed_order();
        self.field_event(EventId::SwitchIn, None)
    }

    fn apply_team_order(&mut self, side: SideId, order: &[u8]) {
        let team = self.side(side).team.clone();
        let mut reordered: Vec<CombatantId> = order
            .iter()
            .filter_map(|&index| team.get(index as usize).copied())
            .collect();
        for member in team {
            if !reordered.contains(&member) {
                reordered.push(member);
            }
        }
        self.side_mut(side).team = reordered;
    }

    /// Puts a combatant into a slot and re-creates its ability and item
    /// states, which is when their effect-order ordinals are assigned.
    fn place_active(
        &mut self,
        side: SideId,
        slot: u8,
        id: CombatantId,
    ) -> Result<(), EngineError> {
        {
            let combatant = self.combatant_mut(id)?;
            combatant.active = true;
            combatant.position = slot;
        }
        if let Some(entry) = self.side_mut(side).active.get_mut(slot as usize) {
            *entry = Some(id);
        }

        if let Some(effect) = self.combatant(id)?.ability.as_ref().map(|a| a.effect) {
            let handle = self.effect(effect)?;
            let state = self.init_effect_state(HolderRef::Combatant(id), &handle, None);
            self.combatant_mut(id)?.ability = Some(Attached::new(effect, state));
        }
        if let Some(effect) = self.combatant(id)?.item.as_ref().map(|a| a.effect) {
            let handle = self.effect(effect)?;
            let state = self.init_effect_state(HolderRef::Combatant(id), &handle, None);
            self.combatant_mut(id)?.item = Some(Attached::new(effect, state));
        }
        Ok(())
    }

    fn perform_switch(
        &mut self,
        user: CombatantId,
        replacement: CombatantId,
        source_effect: Option<crate::effect::EffectId>,
    ) -> Result<(), EngineError> {
        let side = self.combatant(user)?.side;
        {
            let incoming = self.combatant(replacement)?;
            if incoming.side != side || incoming.fainted || incoming.active {
                return Err(ContractError::UnresolvableChoice {
                    choice: "switch",
                    reason: "replacement is not available",
                }
                .into());
            }
        }

        let slot = if self.combatant(user)?.active {
            let slot = self.side(side).slot_of(user).ok_or(
                ContractError::UnresolvableChoice {
                    choice: "switch",
                    reason: "user holds no slot",
                },
            )?;

            self.run_event(
                EventId::SwitchOut,
                Some(HolderRef::Combatant(user)),
                None,
                source_effect,
                RelayValue::NoOpinion,
            )?;

            // The forced-out holder loses everything it had queued and
            // everything bound to its presence.
            self.queue.cancel_actions(user);
            let keys: Vec<StateKey> = self
                .combatant(user)?
                .volatiles
                .iter()
                .map(|v| StateKey::Volatile(user, v.effect))
                .collect();
            for key in keys {
                self.remove_attachment(key);
            }
            self.combatant_mut(user)?.active = false;
            if let Some(entry) = self.side_mut(side).active.get_mut(slot as usize) {
                *entry = None;
            }
            slot
        } else {
            // Replacing a fainted (already vacated) slot.
            self.side(side)
                .active
                .iter()
                .position(|slot| slot.is_none())
                .ok_or(ContractError::UnresolvableChoice {
                    choice: "switch",
                    reason: "no open slot on the side",
                })? as u8
        };

        self.needs_switch.retain(|&pending| pending != user);
        self.place_active(side, slot, replacement)?;
        self.update_speed_order();
        self.field_event(EventId::SwitchIn, Some(&[replacement]))
    }

    fn run_move(&mut self, action: &Action) -> Result<(), EngineError> {
        let Some(user) = action.user else {
            return Ok(());
        };
        if !self.combatant(user)?.can_act() {
            debug!(%user, "move fizzles: user can no longer act");
            return Ok(());
        }
        let Some(effect) = action.move_effect() else {
            return Ok(());
        };
        let target = match &action.payload {
            ActionPayload::Move { target, .. } => *target,
            _ => None,
        };

        let gate = self.run_event(
            EventId::BeforeMove,
            Some(HolderRef::Combatant(user)),
            target,
            Some(effect),
            RelayValue::NoOpinion,
        )?;
        if !gate.is_truthy() {
            debug!(%user, "move prevented before execution");
            return Ok(());
        }

        let holder = HolderRef::Combatant(target.unwrap_or(user));
        self.single_event(
            EventId::UseMove,
            effect,
            None,
            Some(holder),
            Some(user),
            Some(effect),
            RelayValue::NoOpinion,
        )?;
        self.run_event(
            EventId::AfterMove,
            Some(HolderRef::Combatant(user)),
            target,
            Some(effect),
            RelayValue::NoOpinion,
        )?;
        Ok(())
    }

    // ========================================================================
    // Faints and the win condition
    // ========================================================================

    /// Settles any combatant whose hp reached zero: fires the faint
    /// event, drops its volatiles, vacates its slot, and cancels its
    /// queued actions.
    pub(crate) fn resolve_faints(&mut self) -> Result<(), EngineError> {
        loop {
            let fallen = match self.all_active().into_iter().find(|&id| {
                self.combatant(id)
                    .map(|c| c.hp <= 0 && !c.fainted)
                    .unwrap_or(false)
            }) {
                Some(id) => id,
                None => return Ok(()),
            };

            let side = {
                let combatant = self.combatant_mut(fallen)?;
                combatant.fainted = true;
                combatant.side
            };
            debug!(combatant = %fallen, "fainted");

            self.run_event(
                EventId::Faint,
                Some(HolderRef::Combatant(fallen)),
                None,
                None,
                RelayValue::NoOpinion,
            )?;

            let keys: Vec<StateKey> = self
                .combatant(fallen)?
                .volatiles
                .iter()
                .map(|v| StateKey::Volatile(fallen, v.effect))
                .collect();
            for key in keys {
                self.remove_attachment(key);
            }

            if let Some(slot) = self.side(side).slot_of(fallen) {
                if let Some(entry) = self.side_mut(side).active.get_mut(slot as usize) {
                    *entry = None;
                }
            }
            self.combatant_mut(fallen)?.active = false;
            self.queue.cancel_actions(fallen);
            if !self.needs_switch.contains(&fallen) {
                self.needs_switch.push(fallen);
            }
        }
    }

    fn check_win(&mut self) {
        if self.ended {
            return;
        }
        let alive = |battle: &Battle, side: &crate::state::Side| {
            side.team.iter().any(|&id| {
                battle
                    .combatant(id)
                    .map(|combatant| !combatant.fainted)
                    .unwrap_or(false)
            })
        };
        let side_zero = alive(self, self.side(SideId(0)));
        let side_one = alive(self, self.side(SideId(1)));
        match (side_zero, side_one) {
            (true, false) => {
                self.ended = true;
                self.winner = Some(SideId(0));
            }
            (false, true) => {
                self.ended = true;
                self.winner = Some(SideId(1));
            }
            (false, false) => {
                self.ended = true;
                self.winner = None;
            }
            (true, true) => {}
        }
    }

    /// Filters the pending-replacement list down to combatants whose side
    /// still has bench members; sides with nobody left simply leave the
    /// slot empty.
    fn pending_replacements(&mut self) -> Vec<CombatantId> {
        let mut pending = Vec::new();
        for &id in &self.needs_switch {
            let has_bench = self
                .combatant(id)
                .ok()
                .map(|combatant| {
                    let side = self.side(combatant.side);
                    side.team.iter().any(|&member| {
                        member != id
                            && self
                                .combatant(member)
                                .map(|m| !m.fainted && !m.active)
                                .unwrap_or(false)
                    })
                })
                .unwrap_or(false);
            if has_bench {
                pending.push(id);
            }
        }
        self.needs_switch = pending.clone();
        pending
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ActionRequest, TurnOutcome};
    use crate::config::EngineConfig;
    use crate::effect::{ContentTable, EffectFlags, EffectId, EffectKind};
    use crate::engine::Battle;
    use crate::event::{EventId, RelayValue};
    use crate::state::{CombatantId, HolderRef, SideId};
    use crate::testutil::{TestEffect, duel, entries, recorded_move, trace_log};

    fn move_request(user: CombatantId, effect: u32, target: CombatantId) -> ActionRequest {
        ActionRequest::Move {
            user,
            move_effect: EffectId(effect),
            target: Some(target),
            form_change: None,
            transform: None,
        }
    }

    /// Runs one full turn where both sides attack, returning the order
    /// the two moves executed in.
    fn run_attack_turn(seed: u64, speed_a: i32, speed_b: i32) -> Vec<String> {
        let log = trace_log();
        let mut content = ContentTable::new();
        content.register(Arc::new(recorded_move(10, "alpha-strike", 0, &log)));
        content.register(Arc::new(recorded_move(11, "bravo-strike", 0, &log)));
        let (mut battle, a, b) = duel(seed, content, speed_a, speed_b);
        battle.start().unwrap();

        let outcome = battle
            .commit_choices(vec![move_request(a, 10, b), move_request(b, 11, a)])
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Continue);
        assert_eq!(battle.turn(), 2);
        entries(&log)
    }

    #[test]
    fn faster_actor_moves_first_under_any_seed() {
        for seed in 0..16 {
            let order = run_attack_turn(seed, 130, 60);
            assert_eq!(order.len(), 2);
            assert!(order[0].starts_with("alpha-strike"));
        }
    }

    #[test]
    fn speed_tie_is_seeded_and_reproducible() {
        let first = run_attack_turn(42, 100, 100);
        let again = run_attack_turn(42, 100, 100);
        assert_eq!(first, again);

        // Some seed resolves the tie the other way.
        let mut saw_alpha_first = false;
        let mut saw_bravo_first = false;
        for seed in 0..64 {
            let order = run_attack_turn(seed, 100, 100);
            if order[0].starts_with("alpha-strike") {
                saw_alpha_first = true;
            } else {
                saw_bravo_first = true;
            }
            if saw_alpha_first && saw_bravo_first {
                break;
            }
        }
        assert!(saw_alpha_first && saw_bravo_first);
    }

    #[test]
    fn higher_priority_beats_higher_speed() {
        let log = trace_log();
        let mut content = ContentTable::new();
        content.register(Arc::new(recorded_move(10, "lunge", 1, &log)));
        content.register(Arc::new(recorded_move(11, "smash", 0, &log)));
        let (mut battle, a, b) = duel(7, content, 40, 200);
        battle.start().unwrap();

        battle
            .commit_choices(vec![move_request(a, 10, b), move_request(b, 11, a)])
            .unwrap();
        let order = entries(&log);
        assert!(order[0].starts_with("lunge"));
    }

    #[test]
    fn inverted_speed_field_reverses_move_order() {
        let log = trace_log();
        let mut content = ContentTable::new();
        content.register(Arc::new(recorded_move(10, "alpha-strike", 0, &log)));
        content.register(Arc::new(recorded_move(11, "bravo-strike", 0, &log)));
        content.register(Arc::new(
            TestEffect::new(50, "warp", EffectKind::Condition)
                .with_flags(EffectFlags::INVERTS_SPEED),
        ));
        let (mut battle, a, b) = duel(3, content, 130, 60);
        battle.start().unwrap();
        battle.add_pseudo_weather(EffectId(50), None).unwrap();

        battle
            .commit_choices(vec![move_request(a, 10, b), move_request(b, 11, a)])
            .unwrap();
        let order = entries(&log);
        // The slower combatant acts first while the field is warped.
        assert!(order[0].starts_with("bravo-strike"));
    }

    #[test]
    fn lethal_hit_pauses_for_replacement_and_cancels_the_queued_move() {
        let log = trace_log();
        let mut content = ContentTable::new();
        let kill_log = Arc::clone(&log);
        content.register(Arc::new(
            TestEffect::new(10, "finisher", EffectKind::Move).with_callback(
                EventId::UseMove,
                move |battle, ctx| {
                    crate::testutil::record(&kill_log, "finisher");
                    if let Some(HolderRef::Combatant(id)) = ctx.target {
                        battle.deal_damage(id, 999)?;
                    }
                    Ok(RelayValue::NoOpinion)
                },
            ),
        ));
        content.register(Arc::new(recorded_move(11, "bravo-strike", 0, &log)));

        let (mut battle, a, b) = duel(5, content, 130, 60);
        let bench = battle.register_combatant(SideId(1), "delta", 50, 100);
        battle.start().unwrap();

        let outcome = battle
            .commit_choices(vec![move_request(a, 10, b), move_request(b, 11, a)])
            .unwrap();
        // The defender fainted before acting: its move is cancelled and
        // the turn pauses for a replacement.
        assert_eq!(outcome, TurnOutcome::AwaitSwitch(vec![b]));
        assert_eq!(entries(&log), vec!["finisher"]);
        assert!(battle.combatant(b).unwrap().fainted);
        assert!(battle.queue().will_move(b).is_none());

        let resumed = battle
            .resume_with_switches(vec![ActionRequest::Switch {
                user: b,
                replacement: bench,
                instant: true,
            }])
            .unwrap();
        assert_eq!(resumed, TurnOutcome::Continue);
        assert!(battle.combatant(bench).unwrap().active);
        assert_eq!(battle.side(SideId(1)).slot_of(bench), Some(0));
        // The fainted combatant's move never ran.
        assert_eq!(entries(&log), vec!["finisher"]);
    }

    #[test]
    fn battle_ends_when_a_side_has_nobody_left() {
        let log = trace_log();
        let mut content = ContentTable::new();
        content.register(Arc::new(
            TestEffect::new(10, "finisher", EffectKind::Move).with_callback(
                EventId::UseMove,
                |battle, ctx| {
                    if let Some(HolderRef::Combatant(id)) = ctx.target {
                        battle.deal_damage(id, 999)?;
                    }
                    Ok(RelayValue::NoOpinion)
                },
            ),
        ));
        content.register(Arc::new(recorded_move(11, "bravo-strike", 0, &log)));
        let (mut battle, a, b) = duel(5, content, 130, 60);
        battle.start().unwrap();

        let outcome = battle
            .commit_choices(vec![move_request(a, 10, b), move_request(b, 11, a)])
            .unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Ended {
                winner: Some(SideId(0))
            }
        );
        assert!(battle.ended());
        assert_eq!(battle.winner(), Some(SideId(0)));
        // Committing after the end is a no-op report, not an error.
        let after = battle.commit_choices(vec![]).unwrap();
        assert!(matches!(after, TurnOutcome::Ended { .. }));
    }

    #[test]
    fn voluntary_switch_resolves_before_moves() {
        let log = trace_log();
        let mut content = ContentTable::new();
        content.register(Arc::new(recorded_move(10, "alpha-strike", 0, &log)));
        let switch_log = Arc::clone(&log);
        content.register(Arc::new(
            TestEffect::new(40, "on-entry", EffectKind::Ability).with_callback(
                EventId::SwitchIn,
                move |_battle, _ctx| {
                    crate::testutil::record(&switch_log, "entered");
                    Ok(RelayValue::NoOpinion)
                },
            ),
        ));
        let (mut battle, a, b) = duel(11, content, 30, 200);
        let bench = battle.register_combatant(SideId(0), "charlie", 70, 100);
        battle.set_ability(bench, EffectId(40)).unwrap();
        battle.start().unwrap();

        let outcome = battle
            .commit_choices(vec![
                ActionRequest::Switch {
                    user: a,
                    replacement: bench,
                    instant: false,
                },
                move_request(b, 10, a),
            ])
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Continue);
        // Switch order (103) precedes move order (200) even though the
        // switching side is far slower.
        assert_eq!(entries(&log), vec!["entered", "alpha-strike"]);
        assert!(!battle.combatant(a).unwrap().active);
        assert!(battle.combatant(bench).unwrap().active);
    }

    #[test]
    fn turn_limit_is_a_catchable_runaway() {
        let content = ContentTable::new();
        let mut config = EngineConfig::new(1);
        config.max_turns = 2;
        let mut battle = Battle::new(config, Arc::new(content));
        battle.register_combatant(SideId(0), "alpha", 100, 100);
        battle.register_combatant(SideId(1), "bravo", 90, 100);
        battle.start().unwrap();

        assert_eq!(battle.commit_choices(vec![]).unwrap(), TurnOutcome::Continue);
        let err = battle.commit_choices(vec![]).unwrap_err();
        assert!(err.is_runaway());
    }

    #[test]
    fn same_seed_replays_identically_with_residual_effects() {
        let run = |seed: u64| -> Vec<String> {
            let log = trace_log();
            let mut content = ContentTable::new();
            content.register(Arc::new(recorded_move(10, "alpha-strike", 0, &log)));
            content.register(Arc::new(recorded_move(11, "bravo-strike", 0, &log)));
            let residual_log = Arc::clone(&log);
            content.register(Arc::new(
                TestEffect::new(60, "seep", EffectKind::Condition)
                    .with_duration(3)
                    .with_callback(EventId::Residual, move |battle, ctx| {
                        if let HolderRef::Combatant(id) = ctx.holder {
                            battle.deal_damage(id, 5)?;
                            crate::testutil::record(&residual_log, format!("seep:{id}"));
                        }
                        Ok(RelayValue::NoOpinion)
                    }),
            ));
            let (mut battle, a, b) = duel(seed, content, 100, 100);
            battle.start().unwrap();
            battle.add_volatile(a, EffectId(60), None).unwrap();
            battle.add_volatile(b, EffectId(60), None).unwrap();

            for _ in 0..2 {
                battle
                    .commit_choices(vec![move_request(a, 10, b), move_request(b, 11, a)])
                    .unwrap();
            }
            entries(&log)
        };

        assert_eq!(run(1234), run(1234));
        // Two turns: two move executions and two residual ticks each.
        assert_eq!(run(1234).len(), 8);
    }

    #[test]
    fn team_select_reorders_the_bench_before_start() {
        let content = ContentTable::new();
        let mut battle = Battle::new(EngineConfig::new(1), Arc::new(content));
        let first = battle.register_combatant(SideId(0), "first", 100, 100);
        let second = battle.register_combatant(SideId(0), "second", 90, 100);
        battle.register_combatant(SideId(1), "foe", 80, 100);

        battle
            .queue_request(ActionRequest::TeamSelect {
                side: SideId(0),
                order: vec![1, 0],
            })
            .unwrap();
        // Team selection (order 1) sorts ahead of the start action
        // (order 2), so the reordered lead is the one that enters.
        battle.start().unwrap();
        assert!(battle.combatant(second).unwrap().active);
        assert!(!battle.combatant(first).unwrap().active);
        assert_eq!(battle.side(SideId(0)).team[0], second);
    }

    #[test]
    fn pass_and_generic_choices() {
        let log = trace_log();
        let mut content = ContentTable::new();
        content.register(Arc::new(
            TestEffect::new(1, "alert", EffectKind::Condition).with_callback(
                EventId::Weather,
                {
                    let log = Arc::clone(&log);
                    move |_battle, _ctx| {
                        crate::testutil::record(&log, "alert");
                        Ok(RelayValue::NoOpinion)
                    }
                },
            ),
        ));
        let (mut battle, a, _b) = duel(1, content, 100, 90);
        battle.start().unwrap();
        battle.add_volatile(a, EffectId(1), None).unwrap();

        let outcome = battle
            .commit_choices(vec![
                ActionRequest::Pass,
                ActionRequest::Generic {
                    user: a,
                    event: EventId::Weather,
                },
            ])
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Continue);
        assert_eq!(entries(&log), vec!["alert"]);
    }
}
