//! Per-heap counts and expiry horizons of a deck

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{Result, SchedulingError};
use super::models::Heap;
use super::placement::CardPlacement;
use super::sources::{DeckConfigStore, PlacementSource};

/// When the next card of a heap expires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "at", rename_all = "camelCase")]
pub enum NextExpiry {
    /// No card of the heap is waiting to expire
    Never,
    At(DateTime<Utc>),
}

/// Counts for one learnt heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapStats {
    pub total: usize,
    /// Cards whose due instant has passed
    pub expired: usize,
    /// Earliest due instant among cards not yet expired.
    ///
    /// This is not the minimum over every card of the heap: expired cards
    /// are left out, and a heap whose cards have all expired reports `Never`.
    pub next_expiry: NextExpiry,
}

impl HeapStats {
    pub const EMPTY: HeapStats = HeapStats {
        total: 0,
        expired: 0,
        next_expiry: NextExpiry::Never,
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckHeapSummary {
    pub deck_id: Uuid,
    pub deck_name: String,
    pub unknown_count: usize,
    /// Learnt heaps holding at least one card
    pub heaps: BTreeMap<Heap, HeapStats>,
}

impl DeckHeapSummary {
    /// Aggregate placements as of `now`
    pub fn from_placements<'p, I>(deck_id: Uuid, deck_name: String, placements: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'p CardPlacement>,
    {
        let mut unknown_count = 0;
        let mut heaps: BTreeMap<Heap, HeapStats> = BTreeMap::new();

        for placement in placements {
            if placement.heap.is_unknown() {
                unknown_count += 1;
                continue;
            }

            let stats = heaps.entry(placement.heap).or_insert(HeapStats::EMPTY);
            stats.total += 1;

            match placement.next_due.instant() {
                Some(due) if due > now => {
                    stats.next_expiry = match stats.next_expiry {
                        NextExpiry::At(current) if current <= due => NextExpiry::At(current),
                        _ => NextExpiry::At(due),
                    };
                }
                _ => stats.expired += 1,
            }
        }

        Self {
            deck_id,
            deck_name,
            unknown_count,
            heaps,
        }
    }

    /// Stats of a learnt heap, empty if no card sits there
    pub fn heap(&self, heap: Heap) -> HeapStats {
        self.heaps.get(&heap).copied().unwrap_or(HeapStats::EMPTY)
    }

    pub fn total_cards(&self) -> usize {
        self.unknown_count + self.heaps.values().map(|s| s.total).sum::<usize>()
    }

    pub fn expired_cards(&self) -> usize {
        self.heaps.values().map(|s| s.expired).sum()
    }
}

/// Summary of one deck
pub fn summarize<S>(store: &S, deck_id: Uuid, now: DateTime<Utc>) -> Result<DeckHeapSummary>
where
    S: DeckConfigStore + PlacementSource + ?Sized,
{
    let deck = store
        .deck(deck_id)?
        .ok_or(SchedulingError::DeckNotFound(deck_id))?;
    let placements = store.deck_placements(deck_id)?;
    Ok(DeckHeapSummary::from_placements(deck.id, deck.name, &placements, now))
}

/// Summaries of every deck owned by `owner_id`, by deck name
pub fn summarize_owner<S>(store: &S, owner_id: Uuid, now: DateTime<Utc>) -> Result<Vec<DeckHeapSummary>>
where
    S: DeckConfigStore + PlacementSource + ?Sized,
{
    let decks = store.decks_of_owner(owner_id)?;
    let mut summaries = Vec::with_capacity(decks.len());
    for deck in decks {
        let placements = store.deck_placements(deck.id)?;
        summaries.push(DeckHeapSummary::from_placements(deck.id, deck.name, &placements, now));
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::models::{Deck, DueAt};
    use crate::scheduling::policy::FIXED_DAILY_POLICY_ID;
    use crate::scheduling::testing::{heap, t0, DeckFixture};
    use chrono::Duration;

    #[test]
    fn test_unknown_and_expired_counts() {
        let fixture = DeckFixture::new();
        let now = t0() + Duration::days(10);
        fixture.add_unreviewed(t0());
        fixture.add_demoted(t0() + Duration::days(1));
        // due now - 1 day
        fixture.add_in_heap(heap(1), now - Duration::days(2));
        // due now + 12 hours
        let pending = fixture.add_in_heap(heap(1), now - Duration::hours(12));

        let summary = summarize(&fixture.store, fixture.deck.id, now).unwrap();

        assert_eq!(summary.unknown_count, 2);
        assert_eq!(summary.heaps.len(), 1);
        let pending_due = fixture
            .store
            .deck_placements(fixture.deck.id)
            .unwrap()
            .into_iter()
            .find(|p| p.card_id == pending)
            .and_then(|p| p.next_due.instant())
            .unwrap();
        assert_eq!(
            summary.heap(heap(1)),
            HeapStats {
                total: 2,
                expired: 1,
                next_expiry: NextExpiry::At(pending_due),
            }
        );
        assert_eq!(pending_due, now + Duration::hours(12));
        assert_eq!(summary.total_cards(), 4);
        assert_eq!(summary.expired_cards(), 1);
    }

    #[test]
    fn test_next_expiry_is_earliest_pending() {
        let deck_id = Uuid::new_v4();
        let now = t0();
        let mut placements = Vec::new();
        for hours in [30, 6, 18] {
            let mut p = CardPlacement::new(deck_id, Uuid::new_v4(), now - Duration::days(5));
            p.heap = heap(3);
            p.next_due = DueAt::At(now + Duration::hours(hours));
            placements.push(p);
        }

        let summary = DeckHeapSummary::from_placements(deck_id, "d".to_string(), &placements, now);
        assert_eq!(
            summary.heap(heap(3)).next_expiry,
            NextExpiry::At(now + Duration::hours(6))
        );
        assert_eq!(summary.heap(heap(3)).expired, 0);
    }

    #[test]
    fn test_empty_heap_never_expires() {
        let fixture = DeckFixture::new();
        let summary = summarize(&fixture.store, fixture.deck.id, t0()).unwrap();
        assert_eq!(summary.total_cards(), 0);
        assert_eq!(summary.heap(heap(7)), HeapStats::EMPTY);
        assert_eq!(summary.heap(heap(7)).next_expiry, NextExpiry::Never);
    }

    #[test]
    fn test_all_expired_heap_has_no_next_expiry() {
        let fixture = DeckFixture::new();
        fixture.add_in_heap(heap(2), t0());
        let summary = summarize(&fixture.store, fixture.deck.id, t0() + Duration::days(3)).unwrap();
        assert_eq!(summary.heap(heap(2)).expired, 1);
        assert_eq!(summary.heap(heap(2)).next_expiry, NextExpiry::Never);
    }

    #[test]
    fn test_deck_not_found() {
        let fixture = DeckFixture::new();
        assert!(matches!(
            summarize(&fixture.store, Uuid::new_v4(), t0()),
            Err(SchedulingError::DeckNotFound(_))
        ));
    }

    #[test]
    fn test_summarize_owner_by_name() {
        let fixture = DeckFixture::new();
        let owner = fixture.deck.owner_id;
        let other = Deck::new(owner, "Alphabet".to_string(), FIXED_DAILY_POLICY_ID, t0());
        fixture.store.insert_deck(&other).unwrap();
        let foreign = Deck::new(Uuid::new_v4(), "Foreign".to_string(), FIXED_DAILY_POLICY_ID, t0());
        fixture.store.insert_deck(&foreign).unwrap();
        fixture.add_unreviewed(t0());

        let summaries = summarize_owner(&fixture.store, owner, t0()).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.deck_name.as_str()).collect();
        assert_eq!(names, vec!["Alphabet", "Fixture"]);
        assert_eq!(summaries[1].unknown_count, 1);
    }
}
