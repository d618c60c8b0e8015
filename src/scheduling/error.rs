use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("Card {card_id} is not in deck {deck_id}")]
    PlacementNotFound { deck_id: Uuid, card_id: Uuid },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl SchedulingError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DeckNotFound(_) | Self::CardNotFound(_) | Self::PlacementNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
