//! Active participants and their speed arithmetic.

use crate::modifier;
use crate::state::{Attached, SideId};

/// Unique identity of a combatant within one battle instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl core::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "combatant#{}", self.0)
    }
}

/// A participant that can hold effects and take queued actions.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: SideId,
    /// Slot index within the side while active.
    pub position: u8,
    pub hp: i32,
    pub max_hp: i32,
    /// Unmodified speed stat.
    pub base_speed: i32,
    /// Stage modifier applied to speed, clamped to -6..=6.
    pub speed_stage: i8,
    pub active: bool,
    pub fainted: bool,
    pub ability: Option<Attached>,
    pub item: Option<Attached>,
    pub volatiles: Vec<Attached>,
}

impl Combatant {
    pub fn new(id: CombatantId, name: impl Into<String>, side: SideId, speed: i32, hp: i32) -> Self {
        Self {
            id,
            name: name.into(),
            side,
            position: 0,
            hp,
            max_hp: hp,
            base_speed: speed,
            speed_stage: 0,
            active: false,
            fainted: false,
            ability: None,
            item: None,
            volatiles: Vec::new(),
        }
    }

    /// Current stage-modified speed. Stages scale by (2+n)/2 upward and
    /// 2/(2-n) downward, combined through the fixed-point path so the
    /// truncation matches every other stat computation.
    pub fn speed(&self) -> i32 {
        let stage = self.speed_stage.clamp(-6, 6) as i64;
        let fraction = if stage >= 0 {
            (2 + stage, 2)
        } else {
            (2, 2 - stage)
        };
        modifier::modify(self.base_speed as i64, fraction) as i32
    }

    /// Speed with stages ignored; the reflection-ability exception reads
    /// this instead of [`Combatant::speed`].
    pub fn unmodified_speed(&self) -> i32 {
        self.base_speed
    }

    /// Adjusts the speed stage, saturating at the -6..=6 bounds.
    pub fn boost_speed(&mut self, delta: i8) {
        self.speed_stage = (self.speed_stage + delta).clamp(-6, 6);
    }

    pub fn volatile(&self, effect: crate::effect::EffectId) -> Option<&Attached> {
        self.volatiles.iter().find(|v| v.effect == effect)
    }

    pub fn has_volatile(&self, effect: crate::effect::EffectId) -> bool {
        self.volatile(effect).is_some()
    }

    /// True while the combatant can still be scheduled.
    pub fn can_act(&self) -> bool {
        self.active && !self.fainted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combatant(speed: i32, stage: i8) -> Combatant {
        let mut c = Combatant::new(CombatantId(1), "unit", SideId(0), speed, 100);
        c.speed_stage = stage;
        c
    }

    #[test]
    fn speed_stages_scale_by_standard_fractions() {
        assert_eq!(combatant(100, 0).speed(), 100);
        assert_eq!(combatant(100, 1).speed(), 150);
        assert_eq!(combatant(100, 2).speed(), 200);
        assert_eq!(combatant(100, -1).speed(), 67);
        assert_eq!(combatant(100, -6).speed(), 25);
    }

    #[test]
    fn unmodified_speed_ignores_stages() {
        let c = combatant(120, 4);
        assert_eq!(c.unmodified_speed(), 120);
        assert!(c.speed() > c.unmodified_speed());
    }

    #[test]
    fn boost_saturates() {
        let mut c = combatant(100, 5);
        c.boost_speed(3);
        assert_eq!(c.speed_stage, 6);
        c.boost_speed(-13);
        assert_eq!(c.speed_stage, -6);
    }
}
