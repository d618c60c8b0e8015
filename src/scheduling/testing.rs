//! Shared fixtures for scheduler tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use super::models::{CardContent, Deck, Heap};
use super::placement::CardPlacement;
use super::policy::{HeapPolicy, FIXED_DAILY_POLICY_ID};
use crate::store::SqliteStore;

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
}

pub(crate) fn heap(n: u8) -> Heap {
    Heap::new(n).unwrap()
}

/// An in-memory store holding one deck on the fixed-daily policy
pub(crate) struct DeckFixture {
    pub store: SqliteStore,
    pub deck: Deck,
}

impl DeckFixture {
    pub fn new() -> Self {
        let store = SqliteStore::open_in_memory().unwrap();
        let deck = Deck::new(Uuid::new_v4(), "Fixture".to_string(), FIXED_DAILY_POLICY_ID, t0());
        store.insert_deck(&deck).unwrap();
        Self { store, deck }
    }

    fn policy(&self) -> &'static HeapPolicy {
        HeapPolicy::from_id(self.deck.heap_policy_id).unwrap()
    }

    pub fn add_content(&self, tags: &[&str]) -> CardContent {
        let mut card = CardContent::new(format!("front {}", Uuid::new_v4()), "back".to_string());
        card.tags = tags.iter().map(|t| t.to_string()).collect();
        self.store.insert_card(&card).unwrap();
        card
    }

    pub fn add_unreviewed(&self, added_at: DateTime<Utc>) -> Uuid {
        let card = self.add_content(&[]);
        self.store
            .insert_placement(&CardPlacement::new(self.deck.id, card.id, added_at))
            .unwrap();
        card.id
    }

    /// A card last reviewed into `target` at `reviewed_at`
    pub fn add_in_heap(&self, target: Heap, reviewed_at: DateTime<Utc>) -> Uuid {
        let card = self.add_content(&[]);
        let mut placement =
            CardPlacement::new(self.deck.id, card.id, reviewed_at - Duration::days(1));
        placement
            .move_to_heap(target, reviewed_at, self.policy())
            .unwrap();
        self.store.insert_placement(&placement).unwrap();
        card.id
    }

    /// A card that reached heap 1 and was demoted back to unknown at `reviewed_at`
    pub fn add_demoted(&self, reviewed_at: DateTime<Utc>) -> Uuid {
        let card = self.add_content(&[]);
        let mut placement =
            CardPlacement::new(self.deck.id, card.id, reviewed_at - Duration::days(2));
        placement
            .move_to_heap(heap(1), reviewed_at - Duration::days(1), self.policy())
            .unwrap();
        placement
            .move_to_heap(Heap::UNKNOWN, reviewed_at, self.policy())
            .unwrap();
        self.store.insert_placement(&placement).unwrap();
        card.id
    }
}
