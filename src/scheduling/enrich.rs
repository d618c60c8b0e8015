//! Joining selected placements with content and per-user data.
//!
//! Runs after selection and never reorders.

use uuid::Uuid;

use super::error::{Result, SchedulingError};
use super::models::{PersonalView, SelectedCard};
use super::placement::CardPlacement;
use super::sources::{CardContentStore, NotificationStore, UserRatingStore};

/// Attach card content to placements, keeping their order
pub fn join_content<S>(store: &S, placements: Vec<CardPlacement>) -> Result<Vec<SelectedCard>>
where
    S: CardContentStore + ?Sized,
{
    if placements.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = placements.iter().map(|p| p.card_id).collect();
    let mut contents = store.cards_by_ids(&ids)?;

    placements
        .into_iter()
        .map(|placement| {
            let content = contents
                .remove(&placement.card_id)
                .ok_or(SchedulingError::CardNotFound(placement.card_id))?;
            Ok(SelectedCard {
                placement,
                content,
                personal: None,
            })
        })
        .collect()
}

/// Fill in the user's rating and notification registration on each card
pub fn attach_personal_view<S>(store: &S, user_id: Uuid, cards: &mut [SelectedCard]) -> Result<()>
where
    S: UserRatingStore + NotificationStore + ?Sized,
{
    if cards.is_empty() {
        return Ok(());
    }

    let ids: Vec<Uuid> = cards.iter().map(|c| c.content.id).collect();
    let ratings = store.user_ratings(user_id, &ids)?;
    let registered = store.registered_cards(user_id, &ids)?;

    for card in cards.iter_mut() {
        card.personal = Some(PersonalView {
            rating: ratings.get(&card.content.id).copied().unwrap_or(0),
            registered_for_notifications: registered.contains(&card.content.id),
        });
    }

    Ok(())
}
