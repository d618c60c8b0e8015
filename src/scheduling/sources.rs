//! Read interfaces the scheduler consumes
//!
//! The engine never owns card content, ratings or notification registrations;
//! it reads them through these traits. `crate::store::SqliteStore` implements
//! all of them.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::{Result, SchedulingError};
use super::models::{CardContent, Deck, Heap};
use super::placement::CardPlacement;
use crate::store::StoreResult;

/// Largest exclusion set a selection accepts. Each excluded id is bound as
/// one SQL parameter, so this stays well under SQLite's host-parameter limit.
pub const MAX_EXCLUDED_CARDS: usize = 10_000;

/// Reject exclusion sets larger than `MAX_EXCLUDED_CARDS`
pub(crate) fn check_excluded(excluded: &HashSet<Uuid>) -> Result<()> {
    if excluded.len() > MAX_EXCLUDED_CARDS {
        return Err(SchedulingError::InvalidArgument(format!(
            "at most {} excluded cards are accepted, got {}",
            MAX_EXCLUDED_CARDS,
            excluded.len()
        )));
    }
    Ok(())
}

/// Deck configuration: policy selection and ownership
pub trait DeckConfigStore {
    fn deck(&self, deck_id: Uuid) -> StoreResult<Option<Deck>>;

    fn decks_of_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Deck>>;
}

/// Card content keyed by card id
pub trait CardContentStore {
    /// Content for every id that exists; missing ids are absent from the map
    fn cards_by_ids(&self, card_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, CardContent>>;

    /// Cards carrying `tag`, best average rating first
    fn cards_with_tag(&self, tag: &str, limit: usize) -> StoreResult<Vec<CardContent>>;
}

/// Personal ratings, 0 when a user never rated a card
pub trait UserRatingStore {
    fn user_ratings(&self, user_id: Uuid, card_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, u8>>;
}

/// Notification registrations
pub trait NotificationStore {
    fn registered_cards(&self, user_id: Uuid, card_ids: &[Uuid]) -> StoreResult<HashSet<Uuid>>;
}

/// Placement queries used by the selectors, summary and browser
pub trait PlacementSource {
    /// Due placements of one learnt heap, oldest due first
    fn due_in_heap(
        &self,
        deck_id: Uuid,
        heap: Heap,
        now: DateTime<Utc>,
        excluded: &HashSet<Uuid>,
        limit: usize,
    ) -> StoreResult<Vec<CardPlacement>>;

    /// Heap-0 placements never reviewed, oldest added first
    fn never_reviewed(
        &self,
        deck_id: Uuid,
        excluded: &HashSet<Uuid>,
        limit: usize,
    ) -> StoreResult<Vec<CardPlacement>>;

    /// Heap-0 placements that were reviewed before, least recently reviewed first
    fn demoted_to_unknown(
        &self,
        deck_id: Uuid,
        excluded: &HashSet<Uuid>,
        limit: usize,
    ) -> StoreResult<Vec<CardPlacement>>;

    fn deck_placements(&self, deck_id: Uuid) -> StoreResult<Vec<CardPlacement>>;

    /// One page of a heap in due order, plus the heap's total row count
    fn heap_page(
        &self,
        deck_id: Uuid,
        heap: Heap,
        offset: usize,
        limit: usize,
    ) -> StoreResult<(Vec<CardPlacement>, usize)>;

    fn placement(&self, deck_id: Uuid, card_id: Uuid) -> StoreResult<Option<CardPlacement>>;
}

/// The single write the review flow performs
pub trait PlacementWriter {
    fn save_placement(&self, placement: &CardPlacement) -> StoreResult<()>;
}
