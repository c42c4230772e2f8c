//! Pure FSRS memory-model formulas. Every function is deterministic over the
//! weight vector; nothing here touches card state.

use crate::config::PARAMETER_COUNT;
use crate::models::Rating;

pub type Weights = [f64; PARAMETER_COUNT];

pub const STABILITY_MIN: f64 = 0.001;
pub const DIFFICULTY_MIN: f64 = 1.0;
pub const DIFFICULTY_MAX: f64 = 10.0;

fn clamp_difficulty(value: f64) -> f64 {
    value.clamp(DIFFICULTY_MIN, DIFFICULTY_MAX)
}

pub fn initial_stability(w: &Weights, rating: Rating) -> f64 {
    w[rating.ordinal() as usize - 1].max(STABILITY_MIN)
}

pub fn initial_difficulty(w: &Weights, rating: Rating) -> f64 {
    let grade = f64::from(rating.ordinal());
    clamp_difficulty(w[4] - (w[5] * (grade - 1.0)).exp() + 1.0)
}

pub fn next_difficulty(w: &Weights, difficulty: f64, rating: Rating) -> f64 {
    let grade = f64::from(rating.ordinal());
    let delta = -w[6] * (grade - 3.0);
    // linear damping: the nudge shrinks as difficulty approaches the ceiling
    let damped = difficulty + delta * (10.0 - difficulty) / 9.0;
    let reverted = w[7] * initial_difficulty(w, Rating::Easy) + (1.0 - w[7]) * damped;
    clamp_difficulty(reverted)
}

pub fn next_stability_on_recall(
    w: &Weights,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
) -> f64 {
    let hard_penalty = if rating == Rating::Hard { w[15] } else { 1.0 };
    let easy_bonus = if rating == Rating::Easy { w[16] } else { 1.0 };
    let growth = w[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-w[9])
        * ((1.0 - retrievability) * w[10]).exp_m1();
    (stability * (1.0 + growth * hard_penalty * easy_bonus)).max(STABILITY_MIN)
}

pub fn next_stability_on_lapse(
    w: &Weights,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    let long_term = w[11]
        * difficulty.powf(-w[12])
        * ((stability + 1.0).powf(w[13]) - 1.0)
        * ((1.0 - retrievability) * w[14]).exp();
    // a lapse must always land below the pre-lapse stability
    let ceiling = stability / (w[17] * w[18]).exp();
    long_term.min(ceiling).max(STABILITY_MIN)
}

/// Power-law forgetting curve shared by retrievability queries and interval
/// sizing. `decay` comes from the last weight; `factor` is pinned so that
/// retrievability after exactly `stability` days equals 0.9.
#[derive(Clone, Copy, Debug)]
pub struct ForgettingCurve {
    decay: f64,
    factor: f64,
}

impl ForgettingCurve {
    pub fn new(decay_weight: f64) -> Self {
        let decay = -decay_weight;
        let factor = 0.9_f64.powf(1.0 / decay) - 1.0;
        Self { decay, factor }
    }

    pub fn retrievability(&self, stability: f64, elapsed_days: f64) -> f64 {
        (1.0 + self.factor * elapsed_days.max(0.0) / stability).powf(self.decay)
    }

    /// Whole days until predicted retrievability falls to `desired_retention`,
    /// clamped to `[1, maximum_interval]`.
    pub fn interval_days(
        &self,
        stability: f64,
        desired_retention: f64,
        maximum_interval: u32,
    ) -> i64 {
        let raw = stability / self.factor * (desired_retention.powf(1.0 / self.decay) - 1.0);
        (raw.round() as i64).clamp(1, i64::from(maximum_interval))
    }
}
