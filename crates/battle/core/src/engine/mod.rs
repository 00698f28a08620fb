//! The battle instance: one logical thread of simulation.
//!
//! [`Battle`] owns every piece of per-instance state — holders, attached
//! effect states, the action queue, the PRNG, the effect-order counter,
//! and the dispatch frame stack. Effects themselves are shared read-only
//! through a [`ContentTable`]; independent instances share nothing else.
//! All attachment and detachment of effects flows through methods here so
//! that `EffectState` lifecycle and effect-order uniqueness hold.

mod dispatch;
mod errors;
mod schedule;
mod turns;

pub use errors::{ContractError, EngineError, RunawayError};
pub use schedule::ActionRequest;
pub use turns::TurnOutcome;

use std::sync::Arc;

use tracing::debug;

use crate::config::EngineConfig;
use crate::effect::{ContentTable, Effect, EffectFlags, EffectId};
use crate::event::EventId;
use crate::modifier::{Factor, ModifierChain};
use crate::prng::Prng;
use crate::queue::ActionQueue;
use crate::state::{
    Attached, Combatant, CombatantId, EffectState, Field, HolderRef, Side, SideId, StateKey,
};

/// Saved context of one in-flight event dispatch.
#[derive(Clone, Debug)]
pub(crate) struct EventFrame {
    pub event: EventId,
    pub modifiers: ModifierChain,
}

/// One simulation instance.
pub struct Battle {
    pub(crate) config: EngineConfig,
    pub(crate) prng: Prng,
    content: Arc<ContentTable>,
    combatants: Vec<Combatant>,
    sides: [Side; EngineConfig::SIDES],
    pub(crate) field: Field,
    /// Format and rule effects, attached for the whole battle.
    pub(crate) format_effects: Vec<Attached>,
    pub(crate) queue: ActionQueue,
    /// Next effect-order ordinal. Strictly increasing, never reused.
    effect_order: u64,
    pub(crate) event_depth: u32,
    pub(crate) frames: Vec<EventFrame>,
    /// Ability suppression nesting (breakable handlers are skipped while
    /// nonzero).
    breakable_suppression: u32,
    /// Field-position values of active combatants, fastest first.
    pub(crate) speed_order: Vec<usize>,
    pub(crate) turn: u32,
    pub(crate) started: bool,
    pub(crate) ended: bool,
    pub(crate) winner: Option<SideId>,
    /// Active combatants that fainted and await a replacement.
    pub(crate) needs_switch: Vec<CombatantId>,
}

impl Battle {
    pub fn new(config: EngineConfig, content: Arc<ContentTable>) -> Self {
        let active = config.active_per_side;
        let seed = config.seed;
        Self {
            config,
            prng: Prng::new(seed),
            content,
            combatants: Vec::new(),
            sides: [Side::new(SideId(0), active), Side::new(SideId(1), active)],
            field: Field::new(),
            format_effects: Vec::new(),
            queue: ActionQueue::new(),
            effect_order: 0,
            event_depth: 0,
            frames: Vec::new(),
            breakable_suppression: 0,
            speed_order: Vec::new(),
            turn: 0,
            started: false,
            ended: false,
            winner: None,
            needs_switch: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn winner(&self) -> Option<SideId> {
        self.winner
    }

    pub fn content(&self) -> &ContentTable {
        &self.content
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn side(&self, id: SideId) -> &Side {
        &self.sides[id.0 as usize]
    }

    pub(crate) fn side_mut(&mut self, id: SideId) -> &mut Side {
        &mut self.sides[id.0 as usize]
    }

    pub fn sides(&self) -> &[Side] {
        &self.sides
    }

    pub fn combatant(&self, id: CombatantId) -> Result<&Combatant, ContractError> {
        self.combatants
            .get(id.0 as usize)
            .ok_or(ContractError::UnknownCombatant(id))
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Result<&mut Combatant, ContractError> {
        self.combatants
            .get_mut(id.0 as usize)
            .ok_or(ContractError::UnknownCombatant(id))
    }

    /// All active combatants in field order (side 0 left to right, then
    /// side 1).
    pub fn all_active(&self) -> Vec<CombatantId> {
        self.sides
            .iter()
            .flat_map(|side| side.active_combatants())
            .collect()
    }

    pub(crate) fn effect(&self, id: EffectId) -> Result<Arc<dyn Effect>, ContractError> {
        self.content.get(id).cloned()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers a combatant on a side's bench. Order of registration is
    /// the initial team order; leads occupy the first slots at start.
    pub fn register_combatant(
        &mut self,
        side: SideId,
        name: impl Into<String>,
        speed: i32,
        hp: i32,
    ) -> CombatantId {
        let id = CombatantId(self.combatants.len() as u32);
        self.combatants.push(Combatant::new(id, name, side, speed, hp));
        self.side_mut(side).team.push(id);
        id
    }

    /// Attaches a format or rule effect for the whole battle.
    pub fn add_format_effect(&mut self, effect: EffectId) -> Result<(), EngineError> {
        let handle = self.effect(effect)?;
        let state = self.init_effect_state(HolderRef::Battle, &handle, None);
        self.format_effects.push(Attached::new(effect, state));
        Ok(())
    }

    // ========================================================================
    // Effect-state lifecycle
    // ========================================================================

    /// Allocates the next effect-order ordinal.
    fn next_effect_order(&mut self) -> u64 {
        self.effect_order += 1;
        self.effect_order
    }

    /// Creates the state record for a fresh attachment.
    ///
    /// The effect-order ordinal is assigned here, exactly once, and only
    /// when the holder participates in ordering: sides, slots, the field
    /// and the battle always do; a combatant only while active.
    pub(crate) fn init_effect_state(
        &mut self,
        holder: HolderRef,
        effect: &Arc<dyn Effect>,
        source: Option<CombatantId>,
    ) -> EffectState {
        let ordered = match holder {
            HolderRef::Combatant(id) => self
                .combatant(id)
                .map(|combatant| combatant.active)
                .unwrap_or(false),
            _ => true,
        };
        let effect_order = if ordered { self.next_effect_order() } else { 0 };
        let source_slot = source.and_then(|id| {
            let combatant = self.combatant(id).ok()?;
            let slot = self.side(combatant.side).slot_of(id)?;
            Some((combatant.side, slot))
        });
        EffectState {
            effect_order,
            duration: effect.duration(),
            source,
            source_slot,
            holder: Some(holder),
        }
    }

    /// Resolves a state key to the attachment it addresses.
    pub fn attached(&self, key: StateKey) -> Option<&Attached> {
        match key {
            StateKey::Ability(id) => self.combatant(id).ok()?.ability.as_ref(),
            StateKey::Item(id) => self.combatant(id).ok()?.item.as_ref(),
            StateKey::Volatile(id, effect) => self.combatant(id).ok()?.volatile(effect),
            StateKey::SideCondition(side, effect) => self.side(side).condition(effect),
            StateKey::SlotCondition(side, slot, effect) => {
                self.side(side).slot_condition(slot, effect)
            }
            StateKey::Weather => self.field.weather.as_ref(),
            StateKey::Terrain => self.field.terrain.as_ref(),
            StateKey::PseudoWeather(effect) => self.field.pseudo(effect),
            StateKey::Format(effect) => {
                self.format_effects.iter().find(|f| f.effect == effect)
            }
        }
    }

    pub fn effect_state(&self, key: StateKey) -> Option<&EffectState> {
        self.attached(key).map(|attached| &attached.state)
    }

    /// Mutable access to one attached state. This is the only mutation
    /// path handlers are given.
    pub fn effect_state_mut(&mut self, key: StateKey) -> Option<&mut EffectState> {
        match key {
            StateKey::Ability(id) => self
                .combatant_mut(id)
                .ok()?
                .ability
                .as_mut()
                .map(|attached| &mut attached.state),
            StateKey::Item(id) => self
                .combatant_mut(id)
                .ok()?
                .item
                .as_mut()
                .map(|attached| &mut attached.state),
            StateKey::Volatile(id, effect) => self
                .combatant_mut(id)
                .ok()?
                .volatiles
                .iter_mut()
                .find(|v| v.effect == effect)
                .map(|attached| &mut attached.state),
            StateKey::SideCondition(side, effect) => self
                .side_mut(side)
                .conditions
                .iter_mut()
                .find(|c| c.effect == effect)
                .map(|attached| &mut attached.state),
            StateKey::SlotCondition(side, slot, effect) => self
                .side_mut(side)
                .slot_conditions
                .get_mut(slot as usize)?
                .iter_mut()
                .find(|c| c.effect == effect)
                .map(|attached| &mut attached.state),
            StateKey::Weather => self.field.weather.as_mut().map(|a| &mut a.state),
            StateKey::Terrain => self.field.terrain.as_mut().map(|a| &mut a.state),
            StateKey::PseudoWeather(effect) => self
                .field
                .pseudo_weather
                .iter_mut()
                .find(|p| p.effect == effect)
                .map(|attached| &mut attached.state),
            StateKey::Format(effect) => self
                .format_effects
                .iter_mut()
                .find(|f| f.effect == effect)
                .map(|attached| &mut attached.state),
        }
    }

    /// Removes an attachment without dispatching anything. The state is
    /// cleared so stale listeners holding this key skip themselves.
    pub(crate) fn remove_attachment(&mut self, key: StateKey) -> Option<Attached> {
        let mut removed = match key {
            StateKey::Ability(id) => self.combatant_mut(id).ok()?.ability.take(),
            StateKey::Item(id) => self.combatant_mut(id).ok()?.item.take(),
            StateKey::Volatile(id, effect) => {
                let combatant = self.combatant_mut(id).ok()?;
                let index = combatant.volatiles.iter().position(|v| v.effect == effect)?;
                Some(combatant.volatiles.remove(index))
            }
            StateKey::SideCondition(side, effect) => {
                let side = self.side_mut(side);
                let index = side.conditions.iter().position(|c| c.effect == effect)?;
                Some(side.conditions.remove(index))
            }
            StateKey::SlotCondition(side, slot, effect) => {
                let conditions = self.side_mut(side).slot_conditions.get_mut(slot as usize)?;
                let index = conditions.iter().position(|c| c.effect == effect)?;
                Some(conditions.remove(index))
            }
            StateKey::Weather => self.field.weather.take(),
            StateKey::Terrain => self.field.terrain.take(),
            StateKey::PseudoWeather(effect) => {
                let index = self
                    .field
                    .pseudo_weather
                    .iter()
                    .position(|p| p.effect == effect)?;
                Some(self.field.pseudo_weather.remove(index))
            }
            StateKey::Format(effect) => {
                let index = self
                    .format_effects
                    .iter()
                    .position(|f| f.effect == effect)?;
                Some(self.format_effects.remove(index))
            }
        };
        if let Some(attached) = removed.as_mut() {
            attached.state.clear();
        }
        removed
    }

    // ========================================================================
    // Attach / detach operations
    // ========================================================================

    /// Attaches a volatile condition to an active combatant and runs its
    /// `Start` handler. Returns false when the condition was already
    /// present or its start handler rejected the attachment.
    pub fn add_volatile(
        &mut self,
        combatant: CombatantId,
        effect: EffectId,
        source: Option<CombatantId>,
    ) -> Result<bool, EngineError> {
        let handle = self.effect(effect)?;
        if self.combatant(combatant)?.has_volatile(effect) {
            return Ok(false);
        }
        let state = self.init_effect_state(HolderRef::Combatant(combatant), &handle, source);
        self.combatant_mut(combatant)?
            .volatiles
            .push(Attached::new(effect, state));
        let key = StateKey::Volatile(combatant, effect);
        let started = self.single_event(
            EventId::Start,
            effect,
            Some(key),
            Some(HolderRef::Combatant(combatant)),
            source,
            None,
            crate::event::RelayValue::NoOpinion,
        )?;
        if !started.is_truthy() {
            debug!(effect = %handle.name(), %combatant, "volatile rejected by its start handler");
            self.remove_attachment(key);
            return Ok(false);
        }
        Ok(true)
    }

    /// Ends and removes a volatile condition.
    pub fn remove_volatile(
        &mut self,
        combatant: CombatantId,
        effect: EffectId,
    ) -> Result<bool, EngineError> {
        let key = StateKey::Volatile(combatant, effect);
        if self.attached(key).is_none() {
            return Ok(false);
        }
        self.end_effect(key)?;
        Ok(true)
    }

    /// Sets a combatant's ability. No start event; abilities announce
    /// themselves at switch-in.
    pub fn set_ability(
        &mut self,
        combatant: CombatantId,
        effect: EffectId,
    ) -> Result<(), EngineError> {
        let handle = self.effect(effect)?;
        let state = self.init_effect_state(HolderRef::Combatant(combatant), &handle, None);
        self.combatant_mut(combatant)?.ability = Some(Attached::new(effect, state));
        Ok(())
    }

    /// Gives a combatant a held item.
    pub fn set_item(
        &mut self,
        combatant: CombatantId,
        effect: EffectId,
    ) -> Result<(), EngineError> {
        let handle = self.effect(effect)?;
        let state = self.init_effect_state(HolderRef::Combatant(combatant), &handle, None);
        self.combatant_mut(combatant)?.item = Some(Attached::new(effect, state));
        Ok(())
    }

    /// Attaches a side condition and runs its `Start` handler under the
    /// side-scoped alias rules.
    pub fn add_side_condition(
        &mut self,
        side: SideId,
        effect: EffectId,
        source: Option<CombatantId>,
    ) -> Result<bool, EngineError> {
        let handle = self.effect(effect)?;
        if self.side(side).condition(effect).is_some() {
            return Ok(false);
        }
        let state = self.init_effect_state(HolderRef::Side(side), &handle, source);
        self.side_mut(side)
            .conditions
            .push(Attached::new(effect, state));
        let key = StateKey::SideCondition(side, effect);
        let started = self.single_event(
            EventId::SideStart,
            effect,
            Some(key),
            Some(HolderRef::Side(side)),
            source,
            None,
            crate::event::RelayValue::NoOpinion,
        )?;
        if !started.is_truthy() {
            self.remove_attachment(key);
            return Ok(false);
        }
        Ok(true)
    }

    pub fn remove_side_condition(
        &mut self,
        side: SideId,
        effect: EffectId,
    ) -> Result<bool, EngineError> {
        let key = StateKey::SideCondition(side, effect);
        if self.attached(key).is_none() {
            return Ok(false);
        }
        self.end_effect(key)?;
        Ok(true)
    }

    /// Attaches a slot condition to one slot of a side.
    pub fn add_slot_condition(
        &mut self,
        side: SideId,
        slot: u8,
        effect: EffectId,
        source: Option<CombatantId>,
    ) -> Result<bool, EngineError> {
        let handle = self.effect(effect)?;
        if self.side(side).slot_condition(slot, effect).is_some() {
            return Ok(false);
        }
        let state = self.init_effect_state(HolderRef::Slot(side, slot), &handle, source);
        if let Some(conditions) = self.side_mut(side).slot_conditions.get_mut(slot as usize) {
            conditions.push(Attached::new(effect, state));
            return Ok(true);
        }
        Ok(false)
    }

    /// Replaces the field weather. The outgoing weather is ended first.
    pub fn set_weather(
        &mut self,
        effect: EffectId,
        source: Option<CombatantId>,
    ) -> Result<bool, EngineError> {
        let handle = self.effect(effect)?;
        if self.field.weather.as_ref().is_some_and(|w| w.effect == effect) {
            return Ok(false);
        }
        if self.field.weather.is_some() {
            self.end_effect(StateKey::Weather)?;
        }
        let state = self.init_effect_state(HolderRef::Field, &handle, source);
        self.field.weather = Some(Attached::new(effect, state));
        let started = self.single_event(
            EventId::FieldStart,
            effect,
            Some(StateKey::Weather),
            Some(HolderRef::Field),
            source,
            None,
            crate::event::RelayValue::NoOpinion,
        )?;
        if !started.is_truthy() {
            self.remove_attachment(StateKey::Weather);
            return Ok(false);
        }
        Ok(true)
    }

    /// Attaches a pseudo-weather to the field.
    pub fn add_pseudo_weather(
        &mut self,
        effect: EffectId,
        source: Option<CombatantId>,
    ) -> Result<bool, EngineError> {
        let handle = self.effect(effect)?;
        if self.field.has_pseudo(effect) {
            return Ok(false);
        }
        let state = self.init_effect_state(HolderRef::Field, &handle, source);
        self.field.pseudo_weather.push(Attached::new(effect, state));
        Ok(true)
    }

    pub fn remove_pseudo_weather(&mut self, effect: EffectId) -> Result<bool, EngineError> {
        let key = StateKey::PseudoWeather(effect);
        if self.attached(key).is_none() {
            return Ok(false);
        }
        self.end_effect(key)?;
        Ok(true)
    }

    // ========================================================================
    // Suppression
    // ========================================================================

    /// Enters a scope in which breakable ability handlers are skipped.
    /// Scopes nest; content is responsible for pairing begin/end.
    pub fn begin_breakable_suppression(&mut self) {
        self.breakable_suppression += 1;
    }

    pub fn end_breakable_suppression(&mut self) {
        self.breakable_suppression = self.breakable_suppression.saturating_sub(1);
    }

    pub(crate) fn suppressing_breakable(&self) -> bool {
        self.breakable_suppression > 0
    }

    // ========================================================================
    // Speed
    // ========================================================================

    /// True while a field effect flagged as speed-inverting is attached.
    pub fn speed_inverted(&self) -> bool {
        self.field.attachments().any(|attached| {
            self.content
                .get(attached.effect)
                .map(|effect| effect.flags().contains(EffectFlags::INVERTS_SPEED))
                .unwrap_or(false)
        })
    }

    /// Action speed of a combatant, read fresh at sort time: the stage
    /// modified speed stat, reversed while the field inverts speed order.
    pub fn action_speed(&self, combatant: CombatantId) -> Result<f64, ContractError> {
        let speed = self.combatant(combatant)?.speed();
        let speed = if self.speed_inverted() { 10239 - speed } else { speed };
        Ok(speed as f64)
    }

    /// Field-position value of a combatant: side index interleaved with
    /// slot, matching the order `speed_order` is expressed in.
    pub(crate) fn field_position(&self, combatant: CombatantId) -> Option<usize> {
        let c = self.combatant(combatant).ok()?;
        let slot = self.side(c.side).slot_of(combatant)?;
        Some(c.side.0 as usize * EngineConfig::SIDES + slot as usize)
    }

    /// Recomputes the global speed order of active combatants. Ties are
    /// resolved through the seeded source, so holders tied on raw speed
    /// still get a stable, reproducible ordering for the switch-in
    /// fractional adjustment.
    pub(crate) fn update_speed_order(&mut self) {
        let mut entries: Vec<(usize, f64)> = Vec::new();
        for side in &self.sides {
            for id in side.active_combatants() {
                if let (Some(position), Ok(speed)) =
                    (self.field_position(id), self.action_speed(id))
                {
                    entries.push((position, speed));
                }
            }
        }
        crate::event::speed_sort(&mut self.prng, &mut entries, |a, b| b.1.total_cmp(&a.1));
        self.speed_order = entries.into_iter().map(|(position, _)| position).collect();
    }

    // ========================================================================
    // Modifier chaining
    // ========================================================================

    /// Chains a factor into the modifier accumulator of the event being
    /// dispatched. Callable only from inside a handler.
    pub fn chain_modify(&mut self, factor: impl Into<Factor>) -> Result<i64, EngineError> {
        let frame = self
            .frames
            .last_mut()
            .ok_or(ContractError::ChainOutsideDispatch)?;
        Ok(frame.modifiers.chain_modify(factor))
    }

    // ========================================================================
    // HP bookkeeping primitives
    // ========================================================================

    /// Applies damage, clamped to remaining hp. Faint resolution happens
    /// after the current action completes.
    pub fn deal_damage(&mut self, target: CombatantId, amount: i64) -> Result<i64, EngineError> {
        let combatant = self.combatant_mut(target)?;
        let dealt = amount.clamp(0, combatant.hp as i64);
        combatant.hp -= dealt as i32;
        Ok(dealt)
    }

    /// Restores hp up to the maximum. Returns the amount actually healed.
    pub fn heal(&mut self, target: CombatantId, amount: i64) -> Result<i64, EngineError> {
        let combatant = self.combatant_mut(target)?;
        let healed = amount.clamp(0, (combatant.max_hp - combatant.hp) as i64);
        combatant.hp += healed as i32;
        Ok(healed)
    }
}

impl core::fmt::Debug for Battle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Battle")
            .field("turn", &self.turn)
            .field("combatants", &self.combatants.len())
            .field("queue", &self.queue.len())
            .field("effect_order", &self.effect_order)
            .field("ended", &self.ended)
            .finish()
    }
}
