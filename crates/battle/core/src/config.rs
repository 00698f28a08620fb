/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Seed for the per-instance PRNG. Same seed + same committed choices
    /// reproduces dispatch order, tie-break shuffles, and queue order
    /// bit for bit.
    pub seed: u64,

    /// Number of simultaneously active slots per side (1 = singles,
    /// 2 = doubles). Must be <= MAX_ACTIVE_PER_SIDE.
    pub active_per_side: usize,

    /// Hard cap on simulated turns before the instance is abandoned as
    /// non-converging.
    pub max_turns: u32,
}

impl EngineConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum active slots per side supported by the fixed-size layouts.
    pub const MAX_ACTIVE_PER_SIDE: usize = 3;
    /// Number of sides in one battle instance.
    pub const SIDES: usize = 2;

    // ===== safety bounds (non-convergence detection) =====
    /// Maximum nested event dispatch depth. Exceeding this indicates a
    /// handler recursion loop, not a rule outcome.
    pub const MAX_EVENT_DEPTH: u32 = 8;
    /// Maximum actions served within a single turn.
    pub const MAX_TURN_STEPS: usize = 1000;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_TURNS: u32 = 1000;

    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            active_per_side: 1,
            max_turns: Self::DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_active_per_side(mut self, active_per_side: usize) -> Self {
        debug_assert!(active_per_side >= 1 && active_per_side <= Self::MAX_ACTIVE_PER_SIDE);
        self.active_per_side = active_per_side;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(0)
    }
}
