use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::models::CardId;

struct FuzzRange {
    start: f64,
    end: f64,
    factor: f64,
}

// wider bands for longer intervals
const FUZZ_RANGES: [FuzzRange; 3] = [
    FuzzRange {
        start: 2.5,
        end: 7.0,
        factor: 0.15,
    },
    FuzzRange {
        start: 7.0,
        end: 20.0,
        factor: 0.1,
    },
    FuzzRange {
        start: 20.0,
        end: f64::INFINITY,
        factor: 0.05,
    },
];

/// Perturb `interval_days` inside a banded window around it. The draw is
/// seeded from the scheduling event itself, so rescheduling the same review
/// always lands on the same day.
pub fn fuzzed_interval_days(
    card_id: CardId,
    due: DateTime<Utc>,
    interval_days: i64,
    maximum_interval: u32,
) -> i64 {
    let interval = interval_days as f64;
    if interval < FUZZ_RANGES[0].start {
        return interval_days;
    }

    let mut delta = 1.0;
    for range in &FUZZ_RANGES {
        delta += range.factor * (interval.min(range.end) - range.start).max(0.0);
    }

    let max_ivl = ((interval + delta).round() as i64).min(i64::from(maximum_interval));
    let min_ivl = ((interval - delta).round() as i64).max(2).min(max_ivl);

    let mut rng = ChaCha8Rng::seed_from_u64(event_seed(card_id, due, interval_days));
    rng.gen_range(min_ivl..=max_ivl)
}

fn event_seed(card_id: CardId, due: DateTime<Utc>, interval_days: i64) -> u64 {
    let mut hasher = DefaultHasher::new();
    card_id.hash(&mut hasher);
    due.timestamp_micros().hash(&mut hasher);
    interval_days.hash(&mut hasher);
    hasher.finish()
}
