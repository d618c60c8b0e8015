//! Deck and placement lifecycle
//!
//! Placements are created in heap 0 when a card joins a deck and disappear
//! with the card's removal or the deck's deletion.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::{Result, SchedulingError};
use super::models::Deck;
use super::placement::CardPlacement;
use super::policy::HeapPolicy;
use super::sources::{DeckConfigStore, PlacementSource};
use crate::store::SqliteStore;

/// Create a deck on the given policy
pub fn create_deck(
    store: &SqliteStore,
    owner_id: Uuid,
    name: &str,
    heap_policy_id: u32,
    now: DateTime<Utc>,
) -> Result<Deck> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SchedulingError::InvalidArgument(
            "deck name must not be empty".to_string(),
        ));
    }
    HeapPolicy::from_id(heap_policy_id)?;

    let deck = Deck::new(owner_id, name.to_string(), heap_policy_id, now);
    store.insert_deck(&deck)?;
    log::info!("Created deck {} ({})", deck.name, deck.id);
    Ok(deck)
}

/// Point a deck at another policy. Existing due instants are kept until the
/// next review of each card.
pub fn change_deck_policy(store: &SqliteStore, deck_id: Uuid, heap_policy_id: u32) -> Result<Deck> {
    let policy = HeapPolicy::from_id(heap_policy_id)?;
    if !store.update_deck_policy(deck_id, heap_policy_id)? {
        return Err(SchedulingError::DeckNotFound(deck_id));
    }
    log::info!("Deck {} now uses heap policy {}", deck_id, policy.name);
    store
        .deck(deck_id)?
        .ok_or(SchedulingError::DeckNotFound(deck_id))
}

/// Put a card into a deck, unreviewed in heap 0
pub fn add_card_to_deck(
    store: &SqliteStore,
    deck_id: Uuid,
    card_id: Uuid,
    now: DateTime<Utc>,
) -> Result<CardPlacement> {
    if store.deck(deck_id)?.is_none() {
        return Err(SchedulingError::DeckNotFound(deck_id));
    }
    if !store.card_exists(card_id)? {
        return Err(SchedulingError::CardNotFound(card_id));
    }
    if let Some(existing) = store.placement(deck_id, card_id)? {
        log::debug!("Card {} already in deck {}", card_id, deck_id);
        return Ok(existing);
    }

    let placement = CardPlacement::new(deck_id, card_id, now);
    store.insert_placement(&placement)?;
    Ok(placement)
}

pub fn remove_card_from_deck(store: &SqliteStore, deck_id: Uuid, card_id: Uuid) -> Result<()> {
    if !store.delete_placement(deck_id, card_id)? {
        return Err(SchedulingError::PlacementNotFound { deck_id, card_id });
    }
    Ok(())
}

pub fn delete_deck(store: &SqliteStore, deck_id: Uuid) -> Result<()> {
    if !store.delete_deck(deck_id)? {
        return Err(SchedulingError::DeckNotFound(deck_id));
    }
    log::info!("Deleted deck {}", deck_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::models::{CardContent, DueAt};
    use crate::scheduling::policy::{EXPONENTIAL_POLICY_ID, FIXED_DAILY_POLICY_ID};
    use crate::scheduling::review::{ReviewOutcome, ReviewRecorder};
    use crate::scheduling::testing::t0;
    use chrono::Duration;

    fn store_with_card() -> (SqliteStore, CardContent) {
        let store = SqliteStore::open_in_memory().unwrap();
        let card = CardContent::new("Paris".to_string(), "France".to_string());
        store.insert_card(&card).unwrap();
        (store, card)
    }

    #[test]
    fn test_create_deck_validates_policy() {
        let (store, _) = store_with_card();
        let err = create_deck(&store, Uuid::new_v4(), "Geo", 77, t0()).unwrap_err();
        assert!(matches!(err, SchedulingError::Configuration(_)));
        assert!(store.list_decks().unwrap().is_empty());

        let err = create_deck(&store, Uuid::new_v4(), "  ", FIXED_DAILY_POLICY_ID, t0()).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidArgument(_)));
    }

    #[test]
    fn test_add_and_remove_card() {
        let (store, card) = store_with_card();
        let deck = create_deck(&store, Uuid::new_v4(), "Geo", FIXED_DAILY_POLICY_ID, t0()).unwrap();

        let placement = add_card_to_deck(&store, deck.id, card.id, t0()).unwrap();
        assert!(placement.is_never_reviewed());
        let again = add_card_to_deck(&store, deck.id, card.id, t0() + Duration::days(1)).unwrap();
        assert_eq!(again.added_at, t0());

        remove_card_from_deck(&store, deck.id, card.id).unwrap();
        assert!(matches!(
            remove_card_from_deck(&store, deck.id, card.id),
            Err(SchedulingError::PlacementNotFound { .. })
        ));
    }

    #[test]
    fn test_add_unknown_card_or_deck() {
        let (store, card) = store_with_card();
        let deck = create_deck(&store, Uuid::new_v4(), "Geo", FIXED_DAILY_POLICY_ID, t0()).unwrap();
        assert!(matches!(
            add_card_to_deck(&store, deck.id, Uuid::new_v4(), t0()),
            Err(SchedulingError::CardNotFound(_))
        ));
        assert!(matches!(
            add_card_to_deck(&store, Uuid::new_v4(), card.id, t0()),
            Err(SchedulingError::DeckNotFound(_))
        ));
    }

    #[test]
    fn test_policy_change_is_not_retroactive() {
        let (store, card) = store_with_card();
        let deck = create_deck(&store, Uuid::new_v4(), "Geo", FIXED_DAILY_POLICY_ID, t0()).unwrap();
        add_card_to_deck(&store, deck.id, card.id, t0()).unwrap();

        let recorder = ReviewRecorder::new(&store);
        recorder
            .move_to_heap(deck.id, card.id, crate::scheduling::models::Heap::new(4).unwrap(), t0())
            .unwrap();

        change_deck_policy(&store, deck.id, EXPONENTIAL_POLICY_ID).unwrap();
        let kept = store.placement(deck.id, card.id).unwrap().unwrap();
        assert_eq!(kept.next_due, DueAt::At(t0() + Duration::days(4)));

        let now = t0() + Duration::days(4);
        let reviewed = recorder
            .record(deck.id, card.id, ReviewOutcome::Known, now)
            .unwrap();
        assert_eq!(reviewed.next_due, DueAt::At(now + Duration::days(16)));
    }

    #[test]
    fn test_delete_deck() {
        let (store, card) = store_with_card();
        let deck = create_deck(&store, Uuid::new_v4(), "Geo", FIXED_DAILY_POLICY_ID, t0()).unwrap();
        add_card_to_deck(&store, deck.id, card.id, t0()).unwrap();

        delete_deck(&store, deck.id).unwrap();
        assert!(store.placement(deck.id, card.id).unwrap().is_none());
        assert!(matches!(
            delete_deck(&store, deck.id),
            Err(SchedulingError::DeckNotFound(_))
        ));
    }
}
