use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::CardId;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid rating ordinal {0}, expected 1..=4")]
    InvalidRating(i64),
    #[error("review at {review} predates the card's last review at {last_review}")]
    InvalidTimestampOrdering {
        review: DateTime<Utc>,
        last_review: DateTime<Utc>,
    },
    #[error("review log belongs to card {log_card_id}, not card {card_id}")]
    MismatchedCardIdentity { card_id: CardId, log_card_id: CardId },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid card: {0}")]
    InvalidCard(&'static str),
}
