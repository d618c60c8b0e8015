//! Showcase cards for visitors who have no deck yet

use crate::scheduling::error::{Result, SchedulingError};
use crate::scheduling::models::CardContent;
use crate::scheduling::shuffle::Shuffler;
use crate::scheduling::sources::CardContentStore;

/// Candidates read per requested demo card
const DEMO_OVERFETCH: usize = 3;

pub struct DemoCardSampler<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: CardContentStore + ?Sized> DemoCardSampler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Up to `max_count` cards tagged `tag`, drawn from the best rated ones
    pub fn sample<R: Shuffler>(
        &self,
        tag: &str,
        max_count: usize,
        shuffler: &mut R,
    ) -> Result<Vec<CardContent>> {
        if max_count == 0 {
            return Err(SchedulingError::InvalidArgument(
                "max_count must be positive".to_string(),
            ));
        }
        if tag.trim().is_empty() {
            return Err(SchedulingError::InvalidArgument(
                "demo tag must not be empty".to_string(),
            ));
        }

        let candidates = self
            .store
            .cards_with_tag(tag, max_count.saturating_mul(DEMO_OVERFETCH))?;
        log::debug!("{} demo candidates for tag {}", candidates.len(), tag);

        let mut cards = shuffler.shuffled(candidates);
        cards.truncate(max_count);
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::shuffle::{IdentityShuffler, RandomShuffler};
    use crate::store::SqliteStore;
    use uuid::Uuid;

    fn seed(store: &SqliteStore, front: &str, tags: &[&str], rating: u8) -> Uuid {
        let mut card = CardContent::new(front.to_string(), "back".to_string());
        card.tags = tags.iter().map(|t| t.to_string()).collect();
        store.insert_card(&card).unwrap();
        store.set_user_rating(Uuid::new_v4(), card.id, rating).unwrap();
        card.id
    }

    #[test]
    fn test_sample_from_best_rated() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut best = Vec::new();
        for i in 0..6 {
            best.push(seed(&store, &format!("good {}", i), &["demo"], 5));
        }
        for i in 0..4 {
            seed(&store, &format!("poor {}", i), &["demo"], 1);
        }
        seed(&store, "untagged", &["other"], 5);

        let cards = DemoCardSampler::new(&store)
            .sample("demo", 2, &mut RandomShuffler::seeded(11))
            .unwrap();

        assert_eq!(cards.len(), 2);
        assert!(cards.iter().all(|c| best.contains(&c.id)));
    }

    #[test]
    fn test_sample_with_identity_keeps_rating_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed(&store, "meh", &["demo"], 2);
        let top = seed(&store, "top", &["demo"], 5);

        let cards = DemoCardSampler::new(&store)
            .sample("demo", 1, &mut IdentityShuffler)
            .unwrap();
        assert_eq!(cards[0].id, top);
    }

    #[test]
    fn test_sample_rejects_bad_arguments() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sampler = DemoCardSampler::new(&store);
        assert!(sampler.sample("demo", 0, &mut IdentityShuffler).is_err());
        assert!(sampler.sample(" ", 3, &mut IdentityShuffler).is_err());
        assert!(sampler.sample("demo", 3, &mut IdentityShuffler).unwrap().is_empty());
    }
}
