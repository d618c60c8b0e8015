//! Selection of cards sitting in heap 0
//!
//! Never-reviewed cards come first. The pool is read oldest-added first with
//! an over-fetch, shuffled, then cut to the budget: long-ignored cards keep a
//! chance to surface without always being presented in insertion order.
//! Cards demoted after a failed review fill the rest of the budget, least
//! recently reviewed first, unshuffled.

use std::collections::HashSet;

use uuid::Uuid;

use super::enrich::{attach_personal_view, join_content};
use super::error::{Result, SchedulingError};
use super::models::SelectedCard;
use super::shuffle::Shuffler;
use super::sources::{
    check_excluded, CardContentStore, DeckConfigStore, NotificationStore, PlacementSource,
    UserRatingStore,
};

/// How many never-reviewed candidates are read per requested card
pub const DEFAULT_NEVER_REVIEWED_OVERFETCH: usize = 3;

/// Upper bound accepted for the over-fetch multiplier
pub const MAX_NEVER_REVIEWED_OVERFETCH: usize = 10;

pub struct UnknownCardSelector<'a, S: ?Sized> {
    store: &'a S,
    overfetch: usize,
}

impl<'a, S> UnknownCardSelector<'a, S>
where
    S: DeckConfigStore
        + PlacementSource
        + CardContentStore
        + UserRatingStore
        + NotificationStore
        + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            overfetch: DEFAULT_NEVER_REVIEWED_OVERFETCH,
        }
    }

    /// Change the never-reviewed over-fetch multiplier, clamped to `1..=MAX_NEVER_REVIEWED_OVERFETCH`
    pub fn with_overfetch(mut self, overfetch: usize) -> Self {
        self.overfetch = overfetch.clamp(1, MAX_NEVER_REVIEWED_OVERFETCH);
        self
    }

    /// Up to `max_count` heap-0 cards of `deck_id`, annotated for `user_id`
    pub fn select<R: Shuffler>(
        &self,
        deck_id: Uuid,
        user_id: Uuid,
        excluded: &HashSet<Uuid>,
        max_count: usize,
        shuffler: &mut R,
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

        let candidates = self.store.never_reviewed(
            deck_id,
            excluded,
            max_count.saturating_mul(self.overfetch),
        )?;
        let candidate_count = candidates.len();
        let mut placements = shuffler.shuffled(candidates);
        placements.truncate(max_count);

        let remaining = max_count - placements.len();
        if remaining > 0 {
            let demoted = self
                .store
                .demoted_to_unknown(deck_id, excluded, remaining)?;
            log::debug!(
                "Deck {}: {} of {} never-reviewed candidates, {} demoted",
                deck_id,
                placements.len(),
                candidate_count,
                demoted.len()
            );
            placements.extend(demoted);
        }

        let mut cards = join_content(self.store, placements)?;
        attach_personal_view(self.store, user_id, &mut cards)?;
        Ok(cards)
    }
}
