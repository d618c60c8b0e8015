//! Per (deck, card) scheduling state

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{Result, SchedulingError};
use super::models::{DueAt, Heap, ReviewState};
use super::policy::HeapPolicy;

/// Where a card sits in one deck's repetition cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlacement {
    pub deck_id: Uuid,
    pub card_id: Uuid,
    pub heap: Heap,
    pub review: ReviewState,
    /// Derived from `heap` and `review` by the deck's policy
    pub next_due: DueAt,
    pub highest_heap_reached: Heap,
    pub times_returned_to_unknown: u32,
    pub added_at: DateTime<Utc>,
}

impl CardPlacement {
    /// Placement for a card just added to a deck
    pub fn new(deck_id: Uuid, card_id: Uuid, added_at: DateTime<Utc>) -> Self {
        Self {
            deck_id,
            card_id,
            heap: Heap::UNKNOWN,
            review: ReviewState::Unreviewed,
            next_due: DueAt::Always,
            highest_heap_reached: Heap::UNKNOWN,
            times_returned_to_unknown: 0,
            added_at: added_at.trunc_subsecs(3),
        }
    }

    pub fn is_never_reviewed(&self) -> bool {
        self.heap.is_unknown() && self.review == ReviewState::Unreviewed
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due.is_due(now)
    }

    /// Move the card into `target` as the result of a review at `reviewed_at`.
    ///
    /// Review instants never go backwards for a placement; the due instant is
    /// always recomputed through `policy`.
    pub fn move_to_heap(
        &mut self,
        target: Heap,
        reviewed_at: DateTime<Utc>,
        policy: &HeapPolicy,
    ) -> Result<()> {
        // Storage keeps milliseconds; truncating here keeps the due instant
        // identical in memory and on disk.
        let reviewed_at = reviewed_at.trunc_subsecs(3);
        if let Some(last) = self.review.last_review() {
            if reviewed_at < last {
                return Err(SchedulingError::InvalidArgument(format!(
                    "review at {} precedes last review at {} for card {}",
                    reviewed_at, last, self.card_id
                )));
            }
        }

        if target.is_unknown() && !self.heap.is_unknown() {
            self.times_returned_to_unknown = self.times_returned_to_unknown.saturating_add(1);
        }
        if target > self.highest_heap_reached {
            self.highest_heap_reached = target;
        }

        self.heap = target;
        self.review = ReviewState::ReviewedAt(reviewed_at);
        self.next_due = policy.due_at(target, reviewed_at);
        Ok(())
    }
}
