use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

pub type CardId = i64;

/// Grading outcome of a single review. Wire ordinals (1=Again .. 4=Easy) are
/// a compatibility contract and never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    pub fn from_ordinal(value: i64) -> Result<Self, CoreError> {
        match value {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            other => Err(CoreError::InvalidRating(other)),
        }
    }
}

impl Serialize for Rating {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        Rating::from_ordinal(value).map_err(serde::de::Error::custom)
    }
}

/// Scheduling phase of a card. The step index only exists while the card is
/// walking a step sequence, so the variants that use it carry it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Learning { step: usize },
    Review,
    Relearning { step: usize },
}

impl State {
    pub fn ordinal(self) -> u8 {
        match self {
            State::Learning { .. } => 1,
            State::Review => 2,
            State::Relearning { .. } => 3,
        }
    }

    pub fn step(self) -> Option<usize> {
        match self {
            State::Learning { step } | State::Relearning { step } => Some(step),
            State::Review => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CardRepr", into = "CardRepr")]
pub struct Card {
    pub card_id: CardId,
    pub state: State,
    pub stability: Option<f64>,
    pub difficulty: Option<f64>,
    pub due: DateTime<Utc>,
    pub last_review: Option<DateTime<Utc>>,
}

impl Card {
    pub fn new(card_id: CardId, due: DateTime<Utc>) -> Self {
        Self {
            card_id,
            state: State::Learning { step: 0 },
            stability: None,
            difficulty: None,
            due,
            last_review: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.last_review.is_none()
    }
}

impl Default for Card {
    fn default() -> Self {
        let now = Utc::now();
        Self::new(now.timestamp_millis(), now)
    }
}

// Flat wire form: `state` as its ordinal next to an optional `step`, in the
// field order external tooling expects.
#[derive(Serialize, Deserialize)]
struct CardRepr {
    card_id: CardId,
    state: u8,
    step: Option<usize>,
    stability: Option<f64>,
    difficulty: Option<f64>,
    due: DateTime<Utc>,
    last_review: Option<DateTime<Utc>>,
}

impl From<Card> for CardRepr {
    fn from(card: Card) -> Self {
        Self {
            card_id: card.card_id,
            state: card.state.ordinal(),
            step: card.state.step(),
            stability: card.stability,
            difficulty: card.difficulty,
            due: card.due,
            last_review: card.last_review,
        }
    }
}

impl TryFrom<CardRepr> for Card {
    type Error = CoreError;

    fn try_from(repr: CardRepr) -> Result<Self, CoreError> {
        let state = match (repr.state, repr.step) {
            (1, step) => State::Learning {
                step: step.unwrap_or(0),
            },
            (2, None) => State::Review,
            (2, Some(_)) => return Err(CoreError::InvalidCard("review card carries a step index")),
            (3, Some(step)) => State::Relearning { step },
            (3, None) => {
                return Err(CoreError::InvalidCard("relearning card is missing its step index"))
            }
            _ => return Err(CoreError::InvalidCard("unknown state ordinal")),
        };
        if repr.stability.is_some() != repr.difficulty.is_some() {
            return Err(CoreError::InvalidCard(
                "stability and difficulty must be set together",
            ));
        }
        Ok(Card {
            card_id: repr.card_id,
            state,
            stability: repr.stability,
            difficulty: repr.difficulty,
            due: repr.due,
            last_review: repr.last_review,
        })
    }
}

/// Immutable record of one grading event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub card_id: CardId,
    pub rating: Rating,
    pub review_datetime: DateTime<Utc>,
    pub review_duration: Option<u32>,
}

impl ReviewLog {
    pub fn new(
        card_id: CardId,
        rating: Rating,
        review_datetime: DateTime<Utc>,
        review_duration: Option<u32>,
    ) -> Self {
        Self {
            card_id,
            rating,
            review_datetime,
            review_duration,
        }
    }
}
