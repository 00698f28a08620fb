//! Field-wide conditions: weather, terrain, and pseudo-weather.

use crate::effect::EffectId;
use crate::state::Attached;

/// The shared field both sides stand on.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    pub weather: Option<Attached>,
    pub terrain: Option<Attached>,
    /// Pseudo-weather effects in attach order.
    pub pseudo_weather: Vec<Attached>,
}

impl Field {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pseudo(&self, effect: EffectId) -> Option<&Attached> {
        self.pseudo_weather.iter().find(|p| p.effect == effect)
    }

    pub fn has_pseudo(&self, effect: EffectId) -> bool {
        self.pseudo(effect).is_some()
    }

    /// All field-scoped attachments: pseudo-weather first (attach order),
    /// then weather, then terrain. This is the iteration order handler
    /// discovery uses before sorting.
    pub fn attachments(&self) -> impl Iterator<Item = &Attached> {
        self.pseudo_weather
            .iter()
            .chain(self.weather.iter())
            .chain(self.terrain.iter())
    }
}
