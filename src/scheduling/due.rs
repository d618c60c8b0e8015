//! Selection of learnt cards whose review is due
//!
//! Heaps are walked from the highest down to 1. Missing the window of a high
//! heap costs more retention than missing a low one, so a due heap-4 card is
//! always presented before a due heap-1 card. Within a heap the most overdue
//! card comes first.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::enrich::join_content;
use super::error::{Result, SchedulingError};
use super::models::{Heap, SelectedCard};
use super::sources::{check_excluded, CardContentStore, DeckConfigStore, PlacementSource};

pub struct DueCardSelector<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> DueCardSelector<'a, S>
where
    S: DeckConfigStore + PlacementSource + CardContentStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Up to `max_count` due cards of `deck_id`, highest heap first
    pub fn select(
        &self,
        deck_id: Uuid,
        now: DateTime<Utc>,
        excluded: &HashSet<Uuid>,
        max_count: usize,
    ) -> Result<Vec<SelectedCard>> {
        if max_count == 0 {
            return Err(SchedulingError::InvalidArgument(
                "max_count must be positive".to_string(),
            ));
        }
        check_excluded(excluded)?;
        if self.store.deck(deck_id)?.is_none() {
            return Err(SchedulingError::DeckNotFound(deck_id));
        }

        // max_count may be far larger than any deck
        let mut placements = Vec::new();
        for heap in Heap::learnt_descending() {
            let remaining = max_count - placements.len();
            if remaining == 0 {
                log::debug!(
                    "Due selection for deck {} filled before heap {}",
                    deck_id,
                    heap
                );
                break;
            }

            let due = self
                .store
                .due_in_heap(deck_id, heap, now, excluded, remaining)?;
            if !due.is_empty() {
                log::debug!("Deck {} heap {}: {} due cards", deck_id, heap, due.len());
            }
            placements.extend(due);
        }

        join_content(self.store, placements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::models::DueAt;
    use crate::scheduling::sources::MAX_EXCLUDED_CARDS;
    use crate::scheduling::testing::{heap, t0, DeckFixture};
    use chrono::Duration;

    /// Heaps {0,0,1,1,1,2,4,4} with exactly one heap-1 and one heap-2 card due.
    fn scenario_a() -> (DeckFixture, Uuid, Uuid, DateTime<Utc>) {
        let fixture = DeckFixture::new();
        // fixed-daily policy: due = review + heap days
        let now = t0() + Duration::days(10);

        fixture.add_unreviewed(t0());
        fixture.add_unreviewed(t0());
        let due_heap1 = fixture.add_in_heap(heap(1), now - Duration::days(2));
        fixture.add_in_heap(heap(1), now - Duration::hours(12));
        fixture.add_in_heap(heap(1), now);
        let due_heap2 = fixture.add_in_heap(heap(2), now - Duration::days(3));
        fixture.add_in_heap(heap(4), now - Duration::days(1));
        fixture.add_in_heap(heap(4), now - Duration::days(2));

        (fixture, due_heap1, due_heap2, now)
    }

    #[test]
    fn test_higher_heap_first() {
        let (fixture, due_heap1, due_heap2, now) = scenario_a();
        let selected = DueCardSelector::new(&fixture.store)
            .select(fixture.deck.id, now, &HashSet::new(), 10)
            .unwrap();

        let ids: Vec<Uuid> = selected.iter().map(|c| c.content.id).collect();
        assert_eq!(ids, vec![due_heap2, due_heap1]);
    }

    #[test]
    fn test_order_within_heap_and_never_future() {
        let fixture = DeckFixture::new();
        let now = t0() + Duration::days(30);
        let later = fixture.add_in_heap(heap(3), now - Duration::days(4));
        let earlier = fixture.add_in_heap(heap(3), now - Duration::days(9));
        fixture.add_in_heap(heap(3), now - Duration::days(1));
        let low = fixture.add_in_heap(heap(1), now - Duration::days(5));

        let selected = DueCardSelector::new(&fixture.store)
            .select(fixture.deck.id, now, &HashSet::new(), 10)
            .unwrap();

        let ids: Vec<Uuid> = selected.iter().map(|c| c.content.id).collect();
        assert_eq!(ids, vec![earlier, later, low]);
        assert!(selected.iter().all(|c| c.placement.is_due(now)));
        assert!(selected.iter().all(|c| c.personal.is_none()));
    }

    #[test]
    fn test_budget_filled_from_higher_heaps() {
        let fixture = DeckFixture::new();
        let now = t0() + Duration::days(30);
        let top: Vec<Uuid> = (0..3)
            .map(|i| fixture.add_in_heap(heap(5), now - Duration::days(10 + i)))
            .collect();
        for _ in 0..3 {
            fixture.add_in_heap(heap(1), now - Duration::days(3));
        }

        let selected = DueCardSelector::new(&fixture.store)
            .select(fixture.deck.id, now, &HashSet::new(), 3)
            .unwrap();

        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|c| top.contains(&c.content.id)));
    }

    #[test]
    fn test_exclusions() {
        let (fixture, due_heap1, due_heap2, now) = scenario_a();
        let excluded: HashSet<Uuid> = [due_heap2].into_iter().collect();

        let selected = DueCardSelector::new(&fixture.store)
            .select(fixture.deck.id, now, &excluded, 10)
            .unwrap();

        let ids: Vec<Uuid> = selected.iter().map(|c| c.content.id).collect();
        assert_eq!(ids, vec![due_heap1]);
    }

    #[test]
    fn test_nothing_due_is_empty() {
        let fixture = DeckFixture::new();
        fixture.add_unreviewed(t0());
        fixture.add_in_heap(heap(2), t0());

        let selected = DueCardSelector::new(&fixture.store)
            .select(fixture.deck.id, t0() + Duration::days(1), &HashSet::new(), 5)
            .unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_invalid_arguments() {
        let fixture = DeckFixture::new();
        let selector = DueCardSelector::new(&fixture.store);

        assert!(matches!(
            selector.select(fixture.deck.id, t0(), &HashSet::new(), 0),
            Err(SchedulingError::InvalidArgument(_))
        ));
        assert!(matches!(
            selector.select(Uuid::new_v4(), t0(), &HashSet::new(), 5),
            Err(SchedulingError::DeckNotFound(_))
        ));
    }

    #[test]
    fn test_sub_millisecond_review_never_selected_early() {
        let fixture = DeckFixture::new();
        let card = fixture.add_in_heap(heap(1), t0() + Duration::microseconds(999));
        let due = t0() + Duration::days(1);
        let selector = DueCardSelector::new(&fixture.store);

        let early = selector
            .select(fixture.deck.id, due - Duration::microseconds(1), &HashSet::new(), 5)
            .unwrap();
        assert!(early.is_empty());

        let now = due + Duration::microseconds(500);
        let selected = selector.select(fixture.deck.id, now, &HashSet::new(), 5).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].content.id, card);
        assert_eq!(selected[0].placement.next_due, DueAt::At(due));
        assert!(selected[0].placement.is_due(now));
    }

    #[test]
    fn test_unbounded_budget() {
        let (fixture, due_heap1, due_heap2, now) = scenario_a();
        let selected = DueCardSelector::new(&fixture.store)
            .select(fixture.deck.id, now, &HashSet::new(), usize::MAX)
            .unwrap();

        let ids: Vec<Uuid> = selected.iter().map(|c| c.content.id).collect();
        assert_eq!(ids, vec![due_heap2, due_heap1]);
    }

    #[test]
    fn test_exclusion_set_bound() {
        let (fixture, due_heap1, due_heap2, now) = scenario_a();
        let selector = DueCardSelector::new(&fixture.store);

        let mut excluded: HashSet<Uuid> = (0..MAX_EXCLUDED_CARDS - 1).map(|_| Uuid::new_v4()).collect();
        excluded.insert(due_heap2);
        let selected = selector.select(fixture.deck.id, now, &excluded, 10).unwrap();
        let ids: Vec<Uuid> = selected.iter().map(|c| c.content.id).collect();
        assert_eq!(ids, vec![due_heap1]);

        excluded.insert(Uuid::new_v4());
        assert!(matches!(
            selector.select(fixture.deck.id, now, &excluded, 10),
            Err(SchedulingError::InvalidArgument(_))
        ));
    }
}
