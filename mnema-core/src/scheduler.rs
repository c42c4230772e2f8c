use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::{SchedulerConfig, PARAMETER_COUNT};
use crate::errors::CoreError;
use crate::fuzz::fuzzed_interval_days;
use crate::memory::{self, ForgettingCurve, Weights};
use crate::models::{Card, Rating, ReviewLog, State};

/// Applies review outcomes to cards. Construction validates the configuration;
/// after that every operation is a pure function over its arguments.
pub struct Scheduler {
    config: SchedulerConfig,
    weights: Weights,
    curve: ForgettingCurve,
}

enum StepOutcome {
    Step { step: usize, wait: Duration },
    Graduate,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let weights: Weights = config.parameters.as_slice().try_into().map_err(|_| {
            CoreError::InvalidConfiguration("parameter vector has the wrong shape".into())
        })?;
        let curve = ForgettingCurve::new(weights[PARAMETER_COUNT - 1]);
        Ok(Self {
            config,
            weights,
            curve,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Grade `card` at `review_datetime`, producing its next scheduling state
    /// and the log record of the event. The input card is left untouched.
    pub fn review_card(
        &self,
        card: &Card,
        rating: Rating,
        review_datetime: DateTime<Utc>,
        review_duration: Option<u32>,
    ) -> Result<(Card, ReviewLog), CoreError> {
        if let Some(last_review) = card.last_review {
            if review_datetime < last_review {
                return Err(CoreError::InvalidTimestampOrdering {
                    review: review_datetime,
                    last_review,
                });
            }
        }

        let mut next = card.clone();
        let (stability, difficulty) = self.next_memory_state(card, rating, review_datetime);
        next.stability = Some(stability);
        next.difficulty = Some(difficulty);

        let wait = match card.state {
            State::Learning { step } => {
                match walk_steps(&self.config.learning_steps, step, rating) {
                    StepOutcome::Step { step, wait } => {
                        next.state = State::Learning { step };
                        wait
                    }
                    StepOutcome::Graduate => {
                        next.state = State::Review;
                        self.review_wait(card, review_datetime, stability)
                    }
                }
            }
            State::Relearning { step } => {
                match walk_steps(&self.config.relearning_steps, step, rating) {
                    StepOutcome::Step { step, wait } => {
                        next.state = State::Relearning { step };
                        wait
                    }
                    StepOutcome::Graduate => {
                        next.state = State::Review;
                        self.review_wait(card, review_datetime, stability)
                    }
                }
            }
            State::Review => {
                if rating == Rating::Again && !self.config.relearning_steps.is_empty() {
                    next.state = State::Relearning { step: 0 };
                    self.config.relearning_steps[0]
                } else {
                    self.review_wait(card, review_datetime, stability)
                }
            }
        };

        next.due = review_datetime + wait;
        next.last_review = Some(review_datetime);

        debug!(
            card_id = next.card_id,
            rating = rating.label(),
            state = next.state.ordinal(),
            stability,
            difficulty,
            "scheduled next review"
        );

        let log = ReviewLog::new(card.card_id, rating, review_datetime, review_duration);
        Ok((next, log))
    }

    /// Rebuild a card from its full review history. Logs may arrive in any
    /// order; replay always runs in review-time order from a fresh baseline
    /// that keeps only the card's identity.
    pub fn reschedule_card(&self, card: &Card, logs: &[ReviewLog]) -> Result<Card, CoreError> {
        if let Some(stray) = logs.iter().find(|log| log.card_id != card.card_id) {
            return Err(CoreError::MismatchedCardIdentity {
                card_id: card.card_id,
                log_card_id: stray.card_id,
            });
        }
        if logs.is_empty() {
            return Ok(card.clone());
        }

        let mut ordered: Vec<&ReviewLog> = logs.iter().collect();
        // stable sort: simultaneous reviews keep their original relative order
        ordered.sort_by_key(|log| log.review_datetime);

        let mut replayed = Card::new(card.card_id, card.due);
        for log in ordered {
            let (next, _) =
                self.review_card(&replayed, log.rating, log.review_datetime, log.review_duration)?;
            replayed = next;
        }
        debug!(
            card_id = card.card_id,
            reviews = logs.len(),
            "replayed review history"
        );
        Ok(replayed)
    }

    /// Current recall probability for `card`. A card that has never been
    /// reviewed has forgotten nothing, and a query from before the last
    /// review reads as zero elapsed time.
    pub fn get_card_retrievability(&self, card: &Card, current_datetime: DateTime<Utc>) -> f64 {
        match (card.stability, card.last_review) {
            (Some(stability), Some(last_review)) => self
                .curve
                .retrievability(stability, elapsed_days(last_review, current_datetime)),
            _ => 1.0,
        }
    }

    fn next_memory_state(
        &self,
        card: &Card,
        rating: Rating,
        review_datetime: DateTime<Utc>,
    ) -> (f64, f64) {
        let (stability, difficulty) = match (card.stability, card.difficulty) {
            (Some(stability), Some(difficulty)) => (stability, difficulty),
            // first grading ever seeds the memory state
            _ => {
                return (
                    memory::initial_stability(&self.weights, rating),
                    memory::initial_difficulty(&self.weights, rating),
                )
            }
        };

        // failing a card that never graduated restarts it from scratch
        if rating == Rating::Again && matches!(card.state, State::Learning { .. }) {
            return (
                memory::initial_stability(&self.weights, rating),
                memory::initial_difficulty(&self.weights, rating),
            );
        }

        let elapsed = match card.last_review {
            Some(last_review) => elapsed_days(last_review, review_datetime),
            None => 0.0,
        };
        let retrievability = self.curve.retrievability(stability, elapsed);
        let next_stability = match rating {
            Rating::Again => {
                memory::next_stability_on_lapse(&self.weights, difficulty, stability, retrievability)
            }
            _ => memory::next_stability_on_recall(
                &self.weights,
                difficulty,
                stability,
                retrievability,
                rating,
            ),
        };
        (
            next_stability,
            memory::next_difficulty(&self.weights, difficulty, rating),
        )
    }

    // Interval-derived wait for a card landing in Review, fuzzed when enabled.
    fn review_wait(&self, card: &Card, review_datetime: DateTime<Utc>, stability: f64) -> Duration {
        let mut interval = self.curve.interval_days(
            stability,
            self.config.desired_retention,
            self.config.maximum_interval,
        );
        if self.config.enable_fuzzing {
            interval = fuzzed_interval_days(
                card.card_id,
                review_datetime + Duration::days(interval),
                interval,
                self.config.maximum_interval,
            );
        }
        Duration::days(interval)
    }
}

fn walk_steps(steps: &[Duration], step: usize, rating: Rating) -> StepOutcome {
    // no steps configured, or the list shrank under the card: graduate unless
    // the rating failed it back to the start
    if steps.is_empty() || (step >= steps.len() && rating != Rating::Again) {
        return StepOutcome::Graduate;
    }
    match rating {
        Rating::Again => StepOutcome::Step {
            step: 0,
            wait: steps[0],
        },
        Rating::Hard => {
            let wait = if step + 1 < steps.len() {
                (steps[step] + steps[step + 1]) / 2
            } else {
                steps[step]
            };
            StepOutcome::Step { step, wait }
        }
        Rating::Good => {
            if step + 1 >= steps.len() {
                StepOutcome::Graduate
            } else {
                StepOutcome::Step {
                    step: step + 1,
                    wait: steps[step + 1],
                }
            }
        }
        Rating::Easy => StepOutcome::Graduate,
    }
}

fn elapsed_days(last_review: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - last_review).num_milliseconds() as f64 / 86_400_000.0).max(0.0)
}
