//! Handler ordering: listener snapshots, comparators, and the tie-aware
//! selection sort.
//!
//! Every dispatch builds a fresh set of [`EventListener`]s, sorts them
//! with one of the three comparators, and discards them when the dispatch
//! returns. Nothing here is cached between dispatches.

use core::cmp::Ordering;

use crate::effect::{EffectFlags, EffectId, EffectKind, Handler};
use crate::prng::Prng;
use crate::state::{HolderRef, StateKey};

/// Snapshot of one (effect, holder) pair's ordering coordinates for one
/// event.
#[derive(Clone, Debug)]
pub struct EventListener {
    pub effect: EffectId,
    pub effect_name: String,
    pub kind: EffectKind,
    pub flags: EffectFlags,
    /// `None` for duration-only listeners collected by the residual
    /// driver (the effect has no handler but its duration still counts
    /// down).
    pub handler: Option<Handler>,
    pub holder: HolderRef,
    pub state: Option<StateKey>,
    /// Explicit order; `None` means unordered and sorts last.
    pub order: Option<u32>,
    pub priority: i32,
    pub speed: f64,
    pub sub_order: u32,
    pub effect_order: u64,
    /// Snapshot of the attached state's ordinal at collection time; a
    /// mismatch at invocation time means the effect was detached (and
    /// possibly re-attached) by an earlier handler, so the listener is
    /// stale and must be skipped.
    pub state_order: u64,
    /// Position in the target array during spread dispatch.
    pub index: Option<usize>,
}

/// Ordering coordinates shared by event listeners and queued actions.
pub trait Orderable {
    fn order(&self) -> Option<u32>;
    fn priority(&self) -> f64;
    fn speed(&self) -> f64;
    fn sub_order(&self) -> u32;
    fn effect_order(&self) -> u64;

    /// Field-position index for left-to-right comparisons.
    fn position_index(&self) -> Option<usize> {
        None
    }

    /// The attached state's effect order when this entry is backed by an
    /// ability on a combatant; feeds the redirect comparator only.
    fn ability_order(&self) -> Option<u64> {
        None
    }
}

impl Orderable for EventListener {
    fn order(&self) -> Option<u32> {
        self.order
    }

    fn priority(&self) -> f64 {
        self.priority as f64
    }

    fn speed(&self) -> f64 {
        self.speed
    }

    fn sub_order(&self) -> u32 {
        self.sub_order
    }

    fn effect_order(&self) -> u64 {
        self.effect_order
    }

    fn position_index(&self) -> Option<usize> {
        self.index
    }

    fn ability_order(&self) -> Option<u64> {
        match (self.kind, self.holder) {
            (EffectKind::Ability, HolderRef::Combatant(_)) if self.state.is_some() => {
                Some(self.effect_order)
            }
            _ => None,
        }
    }
}

/// The canonical 5-key comparator for handler ordering and action
/// ordering alike:
///
/// 1. Order, low to high (unordered last)
/// 2. Priority, high to low (default 0)
/// 3. Speed, high to low (default 0)
/// 4. SubOrder, low to high (default 0)
/// 5. EffectOrder, low to high (default 0)
pub fn compare_priority<T: Orderable + ?Sized>(a: &T, b: &T) -> Ordering {
    let order = match (a.order(), b.order()) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    order
        .then_with(|| b.priority().total_cmp(&a.priority()))
        .then_with(|| b.speed().total_cmp(&a.speed()))
        .then_with(|| a.sub_order().cmp(&b.sub_order()))
        .then_with(|| a.effect_order().cmp(&b.effect_order()))
}

/// Comparator for competing redirection effects: Priority high to low,
/// Speed high to low, then — only when both sides are ability-sourced —
/// EffectOrder low to high.
pub fn compare_redirect_order<T: Orderable + ?Sized>(a: &T, b: &T) -> Ordering {
    b.priority()
        .total_cmp(&a.priority())
        .then_with(|| b.speed().total_cmp(&a.speed()))
        .then_with(|| match (a.ability_order(), b.ability_order()) {
            (Some(left), Some(right)) => left.cmp(&right),
            _ => Ordering::Equal,
        })
}

/// Comparator for events applied to all active participants in fixed
/// field order: Order low to high (unordered last), Priority high to low,
/// then position index left to right.
pub fn compare_left_to_right_order<T: Orderable + ?Sized>(a: &T, b: &T) -> Ordering {
    let order = match (a.order(), b.order()) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    order
        .then_with(|| b.priority().total_cmp(&a.priority()))
        .then_with(|| {
            let left = a.position_index().unwrap_or(0);
            let right = b.position_index().unwrap_or(0);
            left.cmp(&right)
        })
}

/// In-place sort that resolves comparator ties through the seeded source.
///
/// Selection sort, deliberately: each pass identifies the entire block of
/// entries tied for the next position *before* placing them, then
/// shuffles that block with exactly one call into the PRNG. Non-ties sort
/// deterministically; ties reorder only within their block, and the draw
/// count depends only on block sizes — which is what replays rely on.
pub fn speed_sort<T>(
    prng: &mut Prng,
    list: &mut [T],
    mut compare: impl FnMut(&T, &T) -> Ordering,
) {
    if list.len() < 2 {
        return;
    }

    let mut sorted = 0;
    while sorted + 1 < list.len() {
        // Indexes of every entry tied for the next position.
        let mut next_indexes = vec![sorted];

        for i in (sorted + 1)..list.len() {
            match compare(&list[next_indexes[0]], &list[i]) {
                // Current front-runner is already ahead of list[i].
                Ordering::Less => {}
                // list[i] beats the front-runner; restart the block.
                Ordering::Greater => {
                    next_indexes.clear();
                    next_indexes.push(i);
                }
                Ordering::Equal => next_indexes.push(i),
            }
        }

        // next_indexes is ascending, so earlier swaps never disturb a
        // later source index.
        for (offset, &index) in next_indexes.iter().enumerate() {
            if index != sorted + offset {
                list.swap(sorted + offset, index);
            }
        }

        if next_indexes.len() > 1 {
            prng.shuffle(list, sorted, sorted + next_indexes.len());
        }

        sorted += next_indexes.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Entry {
        order: Option<u32>,
        priority: f64,
        speed: f64,
        sub_order: u32,
        effect_order: u64,
        index: Option<usize>,
    }

    impl Entry {
        fn speedy(speed: f64) -> Self {
            Self {
                order: None,
                priority: 0.0,
                speed,
                sub_order: 0,
                effect_order: 0,
                index: None,
            }
        }
    }

    impl Orderable for Entry {
        fn order(&self) -> Option<u32> {
            self.order
        }
        fn priority(&self) -> f64 {
            self.priority
        }
        fn speed(&self) -> f64 {
            self.speed
        }
        fn sub_order(&self) -> u32 {
            self.sub_order
        }
        fn effect_order(&self) -> u64 {
            self.effect_order
        }
        fn position_index(&self) -> Option<usize> {
            self.index
        }
    }

    #[test]
    fn compare_priority_key_precedence() {
        let base = Entry::speedy(10.0);

        // Explicit order beats everything and sorts ascending.
        let ordered = Entry {
            order: Some(1),
            ..Entry::speedy(1.0)
        };
        assert_eq!(compare_priority(&ordered, &base), Ordering::Less);

        // Priority outranks speed.
        let priority = Entry {
            priority: 1.0,
            ..Entry::speedy(1.0)
        };
        assert_eq!(compare_priority(&priority, &base), Ordering::Less);

        // Higher speed first.
        assert_eq!(
            compare_priority(&Entry::speedy(50.0), &Entry::speedy(10.0)),
            Ordering::Less
        );

        // Sub-order ascending, then effect-order ascending.
        let early_sub = Entry {
            sub_order: 2,
            ..Entry::speedy(10.0)
        };
        let late_sub = Entry {
            sub_order: 7,
            ..Entry::speedy(10.0)
        };
        assert_eq!(compare_priority(&early_sub, &late_sub), Ordering::Less);

        let early_attach = Entry {
            effect_order: 3,
            ..Entry::speedy(10.0)
        };
        let late_attach = Entry {
            effect_order: 9,
            ..Entry::speedy(10.0)
        };
        assert_eq!(compare_priority(&early_attach, &late_attach), Ordering::Less);
    }

    #[test]
    fn left_to_right_uses_position_index() {
        let left = Entry {
            index: Some(0),
            ..Entry::speedy(5.0)
        };
        let right = Entry {
            index: Some(2),
            ..Entry::speedy(500.0)
        };
        // Speed is irrelevant; the leftmost position goes first.
        assert_eq!(compare_left_to_right_order(&left, &right), Ordering::Less);
    }

    #[test]
    fn speed_sort_orders_distinct_entries_regardless_of_input_order() {
        let mut prng = Prng::new(1);
        let mut list = vec![
            Entry::speedy(10.0),
            Entry::speedy(40.0),
            Entry::speedy(20.0),
            Entry::speedy(30.0),
        ];
        speed_sort(&mut prng, &mut list, compare_priority);
        let speeds: Vec<f64> = list.iter().map(|e| e.speed).collect();
        assert_eq!(speeds, vec![40.0, 30.0, 20.0, 10.0]);
    }

    #[test]
    fn speed_sort_reproduces_tied_blocks_per_seed() {
        let tagged = |speed: f64, tag: u64| Entry {
            effect_order: 0,
            sub_order: 0,
            order: None,
            priority: 0.0,
            speed,
            index: Some(tag as usize),
        };
        // Three-way tie at speed 20, bracketed by distinct speeds.
        let build = || {
            vec![
                tagged(20.0, 0),
                tagged(50.0, 1),
                tagged(20.0, 2),
                tagged(20.0, 3),
                tagged(5.0, 4),
            ]
        };

        let mut first = build();
        let mut second = build();
        speed_sort(&mut Prng::new(77), &mut first, compare_priority);
        speed_sort(&mut Prng::new(77), &mut second, compare_priority);
        assert_eq!(first, second);

        // Non-ties never move out of place.
        assert_eq!(first[0].speed, 50.0);
        assert_eq!(first[4].speed, 5.0);

        // A different seed may permute the tied block, but only within it.
        let mut other = build();
        speed_sort(&mut Prng::new(78), &mut other, compare_priority);
        assert_eq!(other[0].speed, 50.0);
        assert_eq!(other[4].speed, 5.0);
        let mut block: Vec<usize> = other[1..4].iter().filter_map(|e| e.index).collect();
        block.sort_unstable();
        assert_eq!(block, vec![0, 2, 3]);
    }
}
