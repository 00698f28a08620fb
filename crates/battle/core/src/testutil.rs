//! Shared test fixtures: scriptable effects and a two-side battle setup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::EngineConfig;
use crate::effect::{ContentTable, Effect, EffectFlags, EffectId, EffectKind, Handler, HandlerOrdering};
use crate::engine::{Battle, EngineError};
use crate::event::{EventContext, EventId, RelayValue};
use crate::state::{CombatantId, SideId};

type Callback = Arc<dyn Fn(&mut Battle, &EventContext) -> Result<RelayValue, EngineError> + Send + Sync>;

/// A scriptable effect for tests: handlers, orderings, and callbacks are
/// all configured per event.
pub struct TestEffect {
    id: EffectId,
    name: String,
    kind: EffectKind,
    flags: EffectFlags,
    duration: Option<u16>,
    base_priority: i32,
    handlers: HashMap<EventId, Handler>,
    orderings: HashMap<EventId, HandlerOrdering>,
    callbacks: HashMap<EventId, Callback>,
}

impl TestEffect {
    pub fn new(id: u32, name: &str, kind: EffectKind) -> Self {
        Self {
            id: EffectId(id),
            name: name.to_string(),
            kind,
            flags: EffectFlags::empty(),
            duration: None,
            base_priority: 0,
            handlers: HashMap::new(),
            orderings: HashMap::new(),
            callbacks: HashMap::new(),
        }
    }

    pub fn with_flags(mut self, flags: EffectFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_duration(mut self, turns: u16) -> Self {
        self.duration = Some(turns);
        self
    }

    pub fn with_base_priority(mut self, priority: i32) -> Self {
        self.base_priority = priority;
        self
    }

    pub fn with_const(mut self, event: EventId, value: RelayValue) -> Self {
        self.handlers.insert(event, Handler::Const(value));
        self
    }

    pub fn with_callback(
        mut self,
        event: EventId,
        callback: impl Fn(&mut Battle, &EventContext) -> Result<RelayValue, EngineError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.handlers.insert(event, Handler::Callback);
        self.callbacks.insert(event, Arc::new(callback));
        self
    }

    pub fn with_notify(
        mut self,
        event: EventId,
        callback: impl Fn(&mut Battle, &EventContext) -> Result<RelayValue, EngineError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.handlers.insert(event, Handler::Notify);
        self.callbacks.insert(event, Arc::new(callback));
        self
    }

    pub fn with_ordering(mut self, event: EventId, ordering: HandlerOrdering) -> Self {
        self.orderings.insert(event, ordering);
        self
    }
}

impl Effect for TestEffect {
    fn id(&self) -> EffectId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EffectKind {
        self.kind
    }

    fn flags(&self) -> EffectFlags {
        self.flags
    }

    fn handler(&self, event: EventId) -> Option<Handler> {
        self.handlers.get(&event).cloned()
    }

    fn ordering(&self, event: EventId) -> HandlerOrdering {
        self.orderings.get(&event).copied().unwrap_or_default()
    }

    fn duration(&self) -> Option<u16> {
        self.duration
    }

    fn base_priority(&self) -> i32 {
        self.base_priority
    }

    fn invoke(&self, battle: &mut Battle, ctx: &EventContext) -> Result<RelayValue, EngineError> {
        match self.callbacks.get(&ctx.event) {
            Some(callback) => callback(battle, ctx),
            None => Ok(RelayValue::NoOpinion),
        }
    }
}

/// Shared invocation log handlers append to, for order assertions.
pub type TraceLog = Arc<Mutex<Vec<String>>>;

pub fn trace_log() -> TraceLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(log: &TraceLog, entry: impl Into<String>) {
    if let Ok(mut entries) = log.lock() {
        entries.push(entry.into());
    }
}

pub fn entries(log: &TraceLog) -> Vec<String> {
    log.lock().map(|entries| entries.clone()).unwrap_or_default()
}

/// A callback that records its effect name and declines to change the
/// relay.
pub fn recording_callback(log: &TraceLog, name: &str) -> impl Fn(&mut Battle, &EventContext) -> Result<RelayValue, EngineError> + Send + Sync + 'static {
    let log = Arc::clone(log);
    let name = name.to_string();
    move |_battle, _ctx| {
        record(&log, name.clone());
        Ok(RelayValue::NoOpinion)
    }
}

/// One combatant per side, default 100 hp. Returns the battle unstarted.
pub fn duel(
    seed: u64,
    content: ContentTable,
    speed_a: i32,
    speed_b: i32,
) -> (Battle, CombatantId, CombatantId) {
    let mut battle = Battle::new(EngineConfig::new(seed), Arc::new(content));
    let a = battle.register_combatant(SideId(0), "alpha", speed_a, 100);
    let b = battle.register_combatant(SideId(1), "bravo", speed_b, 100);
    (battle, a, b)
}

/// A move effect whose use records into the log.
pub fn recorded_move(id: u32, name: &str, priority: i32, log: &TraceLog) -> TestEffect {
    let log = Arc::clone(log);
    let label = name.to_string();
    TestEffect::new(id, name, EffectKind::Move)
        .with_base_priority(priority)
        .with_callback(EventId::UseMove, move |_battle, _ctx| {
            record(&log, label.clone());
            Ok(RelayValue::NoOpinion)
        })
}
