//! Review submission: heap transitions driven by the deck's policy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{Result, SchedulingError};
use super::models::Heap;
use super::placement::CardPlacement;
use super::policy::HeapPolicy;
use super::sources::{DeckConfigStore, PlacementSource, PlacementWriter};

/// What the learner answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewOutcome {
    /// Promote one heap
    Known,
    /// Back to heap 0
    Forgotten,
}

impl ReviewOutcome {
    pub fn target_heap(self, current: Heap) -> Heap {
        match self {
            Self::Known => current.promoted(),
            Self::Forgotten => Heap::UNKNOWN,
        }
    }
}

pub struct ReviewRecorder<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> ReviewRecorder<'a, S>
where
    S: DeckConfigStore + PlacementSource + PlacementWriter + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Apply a review outcome at `now`
    pub fn record(
        &self,
        deck_id: Uuid,
        card_id: Uuid,
        outcome: ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<CardPlacement> {
        self.transition(deck_id, card_id, now, |current| outcome.target_heap(current))
    }

    /// Put a card into `target` as if it had just been reviewed at `now`
    pub fn move_to_heap(
        &self,
        deck_id: Uuid,
        card_id: Uuid,
        target: Heap,
        now: DateTime<Utc>,
    ) -> Result<CardPlacement> {
        self.transition(deck_id, card_id, now, |_| target)
    }

    fn transition(
        &self,
        deck_id: Uuid,
        card_id: Uuid,
        now: DateTime<Utc>,
        target: impl FnOnce(Heap) -> Heap,
    ) -> Result<CardPlacement> {
        let deck = self
            .store
            .deck(deck_id)?
            .ok_or(SchedulingError::DeckNotFound(deck_id))?;
        let policy = HeapPolicy::from_id(deck.heap_policy_id)?;

        let mut placement = self
            .store
            .placement(deck_id, card_id)?
            .ok_or(SchedulingError::PlacementNotFound { deck_id, card_id })?;

        let from = placement.heap;
        let to = target(from);
        placement.move_to_heap(to, now, policy)?;
        self.store.save_placement(&placement)?;

        log::info!(
            "Card {} in deck {}: heap {} -> {} ({})",
            card_id,
            deck_id,
            from,
            to,
            policy.name
        );
        Ok(placement)
    }
}
