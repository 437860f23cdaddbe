use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

use crate::item::Item;
use crate::progress::WordStats;

/// Shuffled copy of `items`
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

pub fn pick_one<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    items.choose(rng)
}

/// Up to `count` distinct elements, uniformly without replacement.
/// Returns fewer when `items` is shorter than `count`.
pub fn pick_n<T: Clone, R: Rng + ?Sized>(items: &[T], count: usize, rng: &mut R) -> Vec<T> {
    items.choose_multiple(rng, count).cloned().collect()
}

/// Weighted random pick.
///
/// Draws a value in `[0, total)` and walks the candidates subtracting each
/// weight until the remainder drops to zero or below. Zero-weight candidates
/// are never picked unless every weight is zero, in which case the last one
/// wins.
pub fn weighted_pick<'a, T, R: Rng + ?Sized>(
    candidates: &'a [(T, u32)],
    rng: &mut R,
) -> Option<&'a T> {
    let total: u64 = candidates.iter().map(|(_, w)| u64::from(*w)).sum();
    if total == 0 {
        return candidates.last().map(|(item, _)| item);
    }

    let mut remainder = rng.gen_range(0.0..total as f64);
    for (item, weight) in candidates {
        if *weight == 0 {
            continue;
        }
        remainder -= f64::from(*weight);
        if remainder <= 0.0 {
            return Some(item);
        }
    }

    candidates.last().map(|(item, _)| item)
}

/// Strategy assigning a selection weight to a candidate item
pub trait ItemWeighting {
    fn weight(&self, item: &Item) -> u32;
}

pub const BASE_WEIGHT: u32 = 10;
pub const UNTRACKED_BONUS: u32 = 25;
pub const NEVER_SHOWN_BONUS: u32 = 20;
pub const STRUGGLING_BONUS: u32 = 15;
pub const STALE_BONUS: u32 = 5;
const STALE_AFTER_HOURS: i64 = 24;

/// Favours items the learner has not seen, struggles with, or has not seen
/// for a day.
pub struct LearnerWeighting {
    stats: HashMap<String, WordStats>,
    now: DateTime<Utc>,
}

impl LearnerWeighting {
    pub fn new(stats: HashMap<String, WordStats>, now: DateTime<Utc>) -> Self {
        Self { stats, now }
    }
}

impl ItemWeighting for LearnerWeighting {
    fn weight(&self, item: &Item) -> u32 {
        let Some(stats) = self.stats.get(&item.id) else {
            return BASE_WEIGHT + UNTRACKED_BONUS;
        };

        let mut weight = BASE_WEIGHT;
        if stats.shown == 0 {
            weight += NEVER_SHOWN_BONUS;
        }
        if stats.mistakes > stats.correct {
            weight += STRUGGLING_BONUS;
        }
        let stale = match stats.last_shown {
            Some(last) => self.now - last > Duration::hours(STALE_AFTER_HOURS),
            None => true,
        };
        if stale {
            weight += STALE_BONUS;
        }
        weight
    }
}
