//! Ordered event dispatch.
//!
//! Three shapes: [`Battle::single_event`] asks exactly one (effect, holder)
//! pair, [`Battle::run_event`] asks every relevant effect in priority
//! order, and [`Battle::each_event`] runs an event once per active
//! combatant. Two drivers sit on top: [`Battle::field_event`] serves the
//! residual/switch-in sweep with duration bookkeeping, and
//! [`Battle::spread_event`] fans one event out across several targets with
//! per-target relay slots.
//!
//! Every dispatch builds its own local, freshly-sorted listener snapshot;
//! nothing is cached between calls, so effects attaching or detaching
//! mid-dispatch can never invalidate an in-progress iteration. Re-entrant
//! dispatch is tracked with an explicit depth counter.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::effect::{Effect, EffectFlags, EffectId, EffectKind, Handler};
use crate::event::{
    EventContext, EventId, EventListener, RelayValue, compare_left_to_right_order,
    compare_priority, compare_redirect_order, speed_sort,
};
use crate::modifier::ModifierChain;
use crate::state::{CombatantId, HolderKind, HolderRef, SideId, StateKey};

use super::{Battle, ContractError, EngineError, EventFrame, RunawayError};

impl Battle {
    // ========================================================================
    // SingleEvent
    // ========================================================================

    /// Asks exactly one (effect, holder) pair for its opinion on `event`.
    ///
    /// Returns the input relay unchanged when the effect has no handler.
    /// When a handler exists but declines (no-opinion), the defaulted
    /// relay (`true` when none was provided) is returned instead.
    pub fn single_event(
        &mut self,
        event: EventId,
        effect: EffectId,
        state: Option<StateKey>,
        target: Option<HolderRef>,
        source: Option<CombatantId>,
        source_effect: Option<EffectId>,
        relay: RelayValue,
    ) -> Result<RelayValue, EngineError> {
        self.check_depth(event)?;
        let handle = self.effect(effect)?;

        let Some(handler) = handle.handler(event) else {
            return Ok(relay);
        };

        if self.skip_for_suppression(&handle) {
            debug!(event = %event, effect = %handle.name(), "handler suppressed");
            return Ok(relay);
        }

        let current = match relay {
            RelayValue::NoOpinion => RelayValue::Bool(true),
            value => value,
        };
        let ctx = EventContext {
            event,
            holder: target.unwrap_or(HolderRef::Battle),
            relay: current.clone(),
            target,
            source,
            source_effect,
            state,
        };

        self.push_frame(event);
        let result = self.invoke_handler(&handle, handler, &ctx);
        self.pop_frame();

        Ok(result?.or_keep(current))
    }

    // ========================================================================
    // RunEvent
    // ========================================================================

    /// Asks every relevant effect, in priority order, threading the relay
    /// forward. See [`Battle::run_event_ext`] for the extended form.
    pub fn run_event(
        &mut self,
        event: EventId,
        target: Option<HolderRef>,
        source: Option<CombatantId>,
        source_effect: Option<EffectId>,
        relay: RelayValue,
    ) -> Result<RelayValue, EngineError> {
        self.run_event_ext(event, target, source, source_effect, relay, false, false)
    }

    /// Extended dispatch. `on_effect` prepends the source effect's own
    /// handler ahead of the discovered listeners; `fast_exit` orders by
    /// the redirect comparator and stops at the first returned opinion.
    pub fn run_event_ext(
        &mut self,
        event: EventId,
        target: Option<HolderRef>,
        source: Option<CombatantId>,
        source_effect: Option<EffectId>,
        relay: RelayValue,
        on_effect: bool,
        fast_exit: bool,
    ) -> Result<RelayValue, EngineError> {
        self.check_depth(event)?;
        let target = target.unwrap_or(HolderRef::Battle);
        let info = event.info();

        let mut handlers = self.find_event_handlers(event, target, source)?;

        if on_effect {
            let effect =
                source_effect.ok_or(ContractError::OnEffectWithoutSource { event })?;
            let handle = self.effect(effect)?;
            if let Some(handler) = handle.handler(event) {
                let listener =
                    self.resolve_listener(event, &handle, Some(handler), target, None, None);
                handlers.insert(0, listener);
            }
        }

        if info.left_to_right {
            handlers.sort_by(compare_left_to_right_order);
        } else if fast_exit {
            handlers.sort_by(compare_redirect_order);
        } else {
            speed_sort(&mut self.prng, &mut handlers, compare_priority);
        }

        let mut current = match relay {
            RelayValue::NoOpinion => RelayValue::Bool(true),
            value => value,
        };

        self.push_frame(event);
        let mut failure: Option<EngineError> = None;
        for listener in &handlers {
            if self.listener_is_stale(listener) {
                debug!(event = %event, effect = %listener.effect_name, "listener detached mid-dispatch, skipped");
                continue;
            }
            if listener.kind == EffectKind::Ability
                && listener.flags.contains(EffectFlags::BREAKABLE)
                && self.suppressing_breakable()
            {
                debug!(event = %event, effect = %listener.effect_name, "breakable handler suppressed");
                continue;
            }
            let Some(handler) = listener.handler.clone() else {
                continue;
            };

            trace!(event = %event, effect = %listener.effect_name, "invoking handler");
            let ctx = EventContext {
                event,
                holder: listener.holder,
                relay: current.clone(),
                target: Some(target),
                source,
                source_effect,
                state: listener.state,
            };
            match self
                .effect(listener.effect)
                .map_err(EngineError::from)
                .and_then(|handle| self.invoke_handler(&handle, handler, &ctx))
            {
                Ok(returned) => {
                    if returned != RelayValue::NoOpinion {
                        current = returned;
                        if !current.is_truthy() || fast_exit {
                            break;
                        }
                    }
                }
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }
        let frame = self.pop_frame();
        if let Some(error) = failure {
            return Err(error);
        }

        let mut result = current;
        // The accumulated event modifier lands on non-negative integer
        // relays exactly once, on the way out.
        if let (RelayValue::Int(value), Some(mut frame)) = (result.clone(), frame) {
            if value >= 0 {
                result = RelayValue::Int(frame.modifiers.final_modify(value));
            }
        }
        Ok(result)
    }

    /// Redirection competition: redirect-ordered, first opinion wins.
    pub fn priority_event(
        &mut self,
        event: EventId,
        target: HolderRef,
        source: Option<CombatantId>,
        source_effect: Option<EffectId>,
        relay: RelayValue,
        on_effect: bool,
    ) -> Result<RelayValue, EngineError> {
        self.run_event_ext(event, Some(target), source, source_effect, relay, on_effect, true)
    }

    // ========================================================================
    // EachEvent
    // ========================================================================

    /// Runs an event with no source on every active combatant, fastest
    /// first, for battle-wide bookkeeping.
    pub fn each_event(
        &mut self,
        event: EventId,
        source_effect: Option<EffectId>,
    ) -> Result<(), EngineError> {
        let mut actives: Vec<(CombatantId, f64)> = Vec::new();
        for id in self.all_active() {
            actives.push((id, self.action_speed(id)?));
        }
        speed_sort(&mut self.prng, &mut actives, |a, b| b.1.total_cmp(&a.1));
        for (id, _) in actives {
            self.run_event(
                event,
                Some(HolderRef::Combatant(id)),
                None,
                source_effect,
                RelayValue::NoOpinion,
            )?;
        }
        Ok(())
    }

    // ========================================================================
    // FieldEvent
    // ========================================================================

    /// The residual / switch-in sweep: collects handlers across the
    /// field, every side, and every active combatant, sorts once, then
    /// serves them one at a time with duration bookkeeping.
    pub fn field_event(
        &mut self,
        event: EventId,
        targets: Option<&[CombatantId]>,
    ) -> Result<(), EngineError> {
        let track_duration = event == EventId::Residual;

        let mut handlers: Vec<EventListener> = Vec::new();
        if let Some(alias) = event.field_alias() {
            handlers.extend(self.find_field_handlers(alias, track_duration, None)?);
        }
        for side_index in 0..EngineConfig::SIDES {
            let side_id = SideId(side_index as u8);
            if let Some(alias) = event.side_alias() {
                handlers.extend(self.find_side_handlers(side_id, alias, track_duration, None)?);
            }
            let actives: Vec<CombatantId> = self.side(side_id).active_combatants().collect();
            for active in actives {
                if let Some(filter) = targets {
                    if !filter.contains(&active) {
                        continue;
                    }
                }
                let holder = HolderRef::Combatant(active);
                handlers.extend(self.find_combatant_handlers(active, event, track_duration)?);
                handlers.extend(self.find_side_handlers(side_id, event, false, Some(holder))?);
                handlers.extend(self.find_field_handlers(event, false, Some(holder))?);
                handlers.extend(self.find_format_handlers(event, track_duration, Some(holder))?);
            }
        }

        speed_sort(&mut self.prng, &mut handlers, compare_priority);

        let mut queue = std::collections::VecDeque::from(handlers);
        while let Some(listener) = queue.pop_front() {
            // Fainted holders no longer answer, except through conditions
            // bound to their slot.
            if let HolderRef::Combatant(id) = listener.holder {
                let fainted = self.combatant(id)?.fainted;
                let slot_bound = matches!(listener.state, Some(StateKey::SlotCondition(..)));
                if fainted && !slot_bound {
                    continue;
                }
            }

            if track_duration {
                if let Some(key) = listener.state {
                    let expired = match self.effect_state_mut(key) {
                        Some(state) => match state.duration.as_mut() {
                            Some(duration) => {
                                *duration = duration.saturating_sub(1);
                                *duration == 0
                            }
                            None => false,
                        },
                        None => false,
                    };
                    if expired {
                        self.end_effect(key)?;
                        if self.ended {
                            return Ok(());
                        }
                        continue;
                    }
                }
            }

            if self.listener_is_stale(&listener) {
                continue;
            }
            if listener.handler.is_none() {
                continue;
            }

            // Side- and field-held effects answer under the scoped alias
            // of the event; a holder kind with no registered alias is a
            // missing engine case.
            let handler_event = match listener.holder.kind() {
                HolderKind::Side | HolderKind::Slot => {
                    event.side_alias().ok_or(ContractError::MissingEventAlias {
                        event,
                        scope: "side",
                    })?
                }
                HolderKind::Field => {
                    event.field_alias().ok_or(ContractError::MissingEventAlias {
                        event,
                        scope: "field",
                    })?
                }
                _ => event,
            };

            self.single_event(
                handler_event,
                listener.effect,
                listener.state,
                Some(listener.holder),
                None,
                None,
                RelayValue::NoOpinion,
            )?;

            self.resolve_faints()?;
            if self.ended {
                return Ok(());
            }
        }
        Ok(())
    }

    // ========================================================================
    // Spread dispatch
    // ========================================================================

    /// Fans one event out across several targets, each with its own relay
    /// slot. A falsy slot stops receiving handlers (a zero stays live for
    /// events flagged that way); the dispatch ends early once every slot
    /// is falsy.
    pub fn spread_event(
        &mut self,
        event: EventId,
        targets: &[CombatantId],
        source: Option<CombatantId>,
        source_effect: Option<EffectId>,
        relays: Vec<RelayValue>,
    ) -> Result<Vec<RelayValue>, EngineError> {
        self.check_depth(event)?;
        let info = event.info();

        let mut handlers: Vec<EventListener> = Vec::new();
        for (index, &target) in targets.iter().enumerate() {
            let mut found =
                self.find_event_handlers(event, HolderRef::Combatant(target), source)?;
            for listener in &mut found {
                listener.index = Some(index);
            }
            handlers.extend(found);
        }

        if info.left_to_right {
            handlers.sort_by(compare_left_to_right_order);
        } else {
            speed_sort(&mut self.prng, &mut handlers, compare_priority);
        }

        let mut slots: Vec<RelayValue> = (0..targets.len())
            .map(|i| match relays.get(i) {
                Some(RelayValue::NoOpinion) | None => RelayValue::Bool(true),
                Some(value) => value.clone(),
            })
            .collect();

        self.push_frame(event);
        let mut failure: Option<EngineError> = None;
        for listener in &handlers {
            let Some(index) = listener.index else { continue };
            let current = slots[index].clone();
            let live_zero = info.zero_relay_live && current == RelayValue::Int(0);
            if !current.is_truthy() && !live_zero {
                continue;
            }
            if self.listener_is_stale(listener) {
                continue;
            }
            if listener.kind == EffectKind::Ability
                && listener.flags.contains(EffectFlags::BREAKABLE)
                && self.suppressing_breakable()
            {
                continue;
            }
            let Some(handler) = listener.handler.clone() else {
                continue;
            };

            let ctx = EventContext {
                event,
                holder: listener.holder,
                relay: current,
                target: Some(HolderRef::Combatant(targets[index])),
                source,
                source_effect,
                state: listener.state,
            };
            match self
                .effect(listener.effect)
                .map_err(EngineError::from)
                .and_then(|handle| self.invoke_handler(&handle, handler, &ctx))
            {
                Ok(returned) => {
                    if returned != RelayValue::NoOpinion {
                        slots[index] = returned;
                        if !slots[index].is_truthy()
                            && slots.iter().all(|slot| !slot.is_truthy())
                        {
                            break;
                        }
                    }
                }
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }
        self.pop_frame();
        if let Some(error) = failure {
            return Err(error);
        }

        Ok(slots)
    }

    // ========================================================================
    // Detach with End dispatch
    // ========================================================================

    /// Ends an attached effect: dispatches its end handler under the
    /// holder-scoped alias, then removes the attachment and clears its
    /// state.
    pub fn end_effect(&mut self, key: StateKey) -> Result<(), EngineError> {
        let Some(attached) = self.attached(key) else {
            return Ok(());
        };
        let effect = attached.effect;
        let holder = attached.state.holder;
        let event = match key {
            StateKey::SideCondition(..) | StateKey::SlotCondition(..) => EventId::SideEnd,
            StateKey::Weather | StateKey::Terrain | StateKey::PseudoWeather(_) => {
                EventId::FieldEnd
            }
            _ => EventId::End,
        };
        self.single_event(event, effect, Some(key), holder, None, None, RelayValue::NoOpinion)?;
        if let Some(removed) = self.remove_attachment(key) {
            debug!(effect = %removed.effect, ?key, "effect ended");
        }
        Ok(())
    }

    // ========================================================================
    // Listener discovery
    // ========================================================================

    fn find_event_handlers(
        &self,
        event: EventId,
        target: HolderRef,
        source: Option<CombatantId>,
    ) -> Result<Vec<EventListener>, EngineError> {
        let info = event.info();
        let mut handlers: Vec<EventListener> = Vec::new();

        match target {
            HolderRef::Combatant(id) => {
                let target_active = self.combatant(id)?.active;
                let source_active = match source {
                    Some(source) => self.combatant(source)?.active,
                    None => false,
                };
                if target_active || source_active {
                    handlers.extend(self.find_combatant_handlers(id, event, false)?);
                    let side = self.combatant(id)?.side;
                    handlers.extend(self.find_side_handlers(side, event, false, None)?);
                    if info.bubbles {
                        if let Some(alias) = event.side_alias() {
                            handlers.extend(self.find_side_handlers(side, alias, false, None)?);
                        }
                    }
                }
            }
            HolderRef::Side(side) => {
                // Side-targeted events bubble down to the side's actives.
                let actives: Vec<CombatantId> = self.side(side).active_combatants().collect();
                for active in actives {
                    handlers.extend(self.find_combatant_handlers(active, event, false)?);
                }
                handlers.extend(self.find_side_handlers(side, event, false, None)?);
                if info.bubbles {
                    if let Some(alias) = event.side_alias() {
                        handlers.extend(self.find_side_handlers(side, alias, false, None)?);
                    }
                }
            }
            HolderRef::Slot(..) | HolderRef::Field | HolderRef::Battle => {}
        }

        handlers.extend(self.find_field_handlers(event, false, None)?);
        if info.bubbles {
            if let Some(alias) = event.field_alias() {
                handlers.extend(self.find_field_handlers(alias, false, None)?);
            }
        }
        handlers.extend(self.find_format_handlers(event, false, None)?);

        Ok(handlers)
    }

    /// Listeners attached to one combatant: volatiles, ability, item, and
    /// the conditions bound to its slot.
    fn find_combatant_handlers(
        &self,
        id: CombatantId,
        event: EventId,
        with_duration: bool,
    ) -> Result<Vec<EventListener>, EngineError> {
        let combatant = self.combatant(id)?;
        let holder = HolderRef::Combatant(id);

        // Materialize the attachment set before resolving anything, so a
        // handler that mutates attachments cannot skew discovery.
        let mut keys: Vec<StateKey> = Vec::new();
        for volatile in &combatant.volatiles {
            keys.push(StateKey::Volatile(id, volatile.effect));
        }
        if combatant.ability.is_some() {
            keys.push(StateKey::Ability(id));
        }
        if combatant.item.is_some() {
            keys.push(StateKey::Item(id));
        }
        let side = combatant.side;
        if let Some(slot) = self.side(side).slot_of(id) {
            if let Some(conditions) = self.side(side).slot_conditions.get(slot as usize) {
                for condition in conditions {
                    keys.push(StateKey::SlotCondition(side, slot, condition.effect));
                }
            }
        }

        self.resolve_keyed(event, keys, with_duration, holder)
    }

    fn find_side_handlers(
        &self,
        side: SideId,
        event: EventId,
        with_duration: bool,
        custom_holder: Option<HolderRef>,
    ) -> Result<Vec<EventListener>, EngineError> {
        let keys: Vec<StateKey> = self
            .side(side)
            .conditions
            .iter()
            .map(|condition| StateKey::SideCondition(side, condition.effect))
            .collect();
        self.resolve_keyed(
            event,
            keys,
            with_duration,
            custom_holder.unwrap_or(HolderRef::Side(side)),
        )
    }

    fn find_field_handlers(
        &self,
        event: EventId,
        with_duration: bool,
        custom_holder: Option<HolderRef>,
    ) -> Result<Vec<EventListener>, EngineError> {
        let mut keys: Vec<StateKey> = self
            .field
            .pseudo_weather
            .iter()
            .map(|pseudo| StateKey::PseudoWeather(pseudo.effect))
            .collect();
        if self.field.weather.is_some() {
            keys.push(StateKey::Weather);
        }
        if self.field.terrain.is_some() {
            keys.push(StateKey::Terrain);
        }
        self.resolve_keyed(event, keys, with_duration, custom_holder.unwrap_or(HolderRef::Field))
    }

    fn find_format_handlers(
        &self,
        event: EventId,
        with_duration: bool,
        custom_holder: Option<HolderRef>,
    ) -> Result<Vec<EventListener>, EngineError> {
        let keys: Vec<StateKey> = self
            .format_effects
            .iter()
            .map(|format| StateKey::Format(format.effect))
            .collect();
        self.resolve_keyed(event, keys, with_duration, custom_holder.unwrap_or(HolderRef::Battle))
    }

    fn resolve_keyed(
        &self,
        event: EventId,
        keys: Vec<StateKey>,
        with_duration: bool,
        holder: HolderRef,
    ) -> Result<Vec<EventListener>, EngineError> {
        let mut listeners = Vec::new();
        for key in keys {
            let Some(attached) = self.attached(key) else { continue };
            let handle = self.effect(attached.effect)?;
            let handler = handle.handler(event);
            let has_duration = with_duration && attached.state.duration.is_some();
            if handler.is_none() && !has_duration {
                continue;
            }
            listeners.push(self.resolve_listener(
                event,
                &handle,
                handler,
                holder,
                Some(key),
                Some(&attached.state),
            ));
        }
        Ok(listeners)
    }

    // ========================================================================
    // Priority resolution
    // ========================================================================

    /// Fills one listener's ordering coordinates for one event, applying
    /// defaults wherever the effect declares no override.
    fn resolve_listener(
        &self,
        event: EventId,
        effect: &Arc<dyn Effect>,
        handler: Option<Handler>,
        holder: HolderRef,
        state: Option<StateKey>,
        state_snapshot: Option<&crate::state::EffectState>,
    ) -> EventListener {
        let info = event.info();
        let ordering = effect.ordering(event);
        let kind = effect.kind();
        let flags = effect.flags();

        let sub_order = ordering
            .sub_order
            .unwrap_or_else(|| default_sub_order(kind, state_snapshot, holder));

        let state_order = state_snapshot.map(|s| s.effect_order).unwrap_or(0);
        let effect_order = if info.uses_effect_order { state_order } else { 0 };

        let mut speed = 0.0;
        if info.uses_speed {
            if let HolderRef::Combatant(id) = holder {
                if let Ok(combatant) = self.combatant(id) {
                    // The reflection-ability exception: competing to bounce
                    // an incoming action reads the unmodified speed.
                    speed = if kind == EffectKind::Ability
                        && flags.contains(EffectFlags::REFLECTING)
                        && event == EventId::RedirectTarget
                    {
                        combatant.unmodified_speed() as f64
                    } else {
                        combatant.speed() as f64
                    };
                    if info.fractional_speed {
                        // Holders earlier in the global speed order resolve
                        // first even at equal raw speed.
                        if let Some(position) = self.field_position(id) {
                            if let Some(rank) =
                                self.speed_order.iter().position(|&p| p == position)
                            {
                                let divisor = (self.config.active_per_side * 2) as f64;
                                speed -= rank as f64 / divisor;
                            }
                        }
                    }
                }
            }
        }

        EventListener {
            effect: effect.id(),
            effect_name: effect.name().to_string(),
            kind,
            flags,
            handler,
            holder,
            state,
            order: ordering.order,
            priority: ordering.priority.unwrap_or(0),
            speed,
            sub_order,
            effect_order,
            state_order,
            index: None,
        }
    }

    // ========================================================================
    // Invocation
    // ========================================================================

    fn invoke_handler(
        &mut self,
        effect: &Arc<dyn Effect>,
        handler: Handler,
        ctx: &EventContext,
    ) -> Result<RelayValue, EngineError> {
        let returned = match handler {
            Handler::Const(value) => value,
            Handler::Callback => effect.invoke(self, ctx)?,
            Handler::Notify => {
                let returned = effect.invoke(self, ctx)?;
                if returned != RelayValue::NoOpinion {
                    return Err(ContractError::UnconvertibleRelay {
                        event: ctx.event,
                        effect: effect.name().to_string(),
                        found: returned.kind_name(),
                    }
                    .into());
                }
                RelayValue::NoOpinion
            }
        };
        self.validate_relay(ctx.event, effect.name(), &returned)?;
        Ok(returned)
    }

    /// Rejects handler payloads the event has no conversion for. This is
    /// a missing engine case, not a rule outcome, and raises immediately.
    fn validate_relay(
        &self,
        event: EventId,
        effect: &str,
        value: &RelayValue,
    ) -> Result<(), ContractError> {
        if event.info().numeric && !value.is_numeric() {
            return Err(ContractError::UnconvertibleRelay {
                event,
                effect: effect.to_string(),
                found: value.kind_name(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Shared plumbing
    // ========================================================================

    fn check_depth(&self, event: EventId) -> Result<(), RunawayError> {
        if self.event_depth >= EngineConfig::MAX_EVENT_DEPTH {
            return Err(RunawayError::EventDepthExceeded {
                event,
                depth: self.event_depth,
            });
        }
        Ok(())
    }

    fn push_frame(&mut self, event: EventId) {
        self.frames.push(EventFrame {
            event,
            modifiers: ModifierChain::new(),
        });
        self.event_depth += 1;
    }

    fn pop_frame(&mut self) -> Option<EventFrame> {
        self.event_depth = self.event_depth.saturating_sub(1);
        self.frames.pop()
    }

    /// A listener is stale when the state it captured has been detached
    /// (or detached and re-attached) since collection.
    fn listener_is_stale(&self, listener: &EventListener) -> bool {
        let Some(key) = listener.state else { return false };
        match self.effect_state(key) {
            Some(state) => {
                !state.is_attached() || state.effect_order != listener.state_order
            }
            None => true,
        }
    }

    fn skip_for_suppression(&self, effect: &Arc<dyn Effect>) -> bool {
        effect.kind() == EffectKind::Ability
            && effect.flags().contains(EffectFlags::BREAKABLE)
            && self.suppressing_breakable()
    }
}

fn default_sub_order(
    kind: EffectKind,
    state: Option<&crate::state::EffectState>,
    holder: HolderRef,
) -> u32 {
    match kind {
        EffectKind::Condition => {
            let holder_kind = state
                .and_then(|s| s.holder)
                .map(|h| h.kind())
                .unwrap_or(holder.kind());
            match holder_kind {
                HolderKind::Combatant => 2,
                HolderKind::Slot => 3,
                HolderKind::Side => 4,
                HolderKind::Field | HolderKind::Battle => 5,
            }
        }
        EffectKind::Weather
        | EffectKind::Terrain
        | EffectKind::Format
        | EffectKind::Rule => 5,
        EffectKind::Ability => 7,
        EffectKind::Item => 8,
        EffectKind::Move => 0,
    }
}
