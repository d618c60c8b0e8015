use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use heapcards_lib::scheduling::{lifecycle, CardContent};

use crate::app::App;
use crate::OutputFormat;

/// Fields of a card created from the command line
pub struct NewCard<'a> {
    pub front: String,
    pub back: String,
    pub info: String,
    /// Comma-separated
    pub tags: Option<&'a str>,
    pub language: String,
}

pub fn run_add(app: &App, deck_name: &str, new_card: NewCard<'_>, format: &OutputFormat) -> Result<()> {
    let deck = app.find_deck(deck_name)?;

    let mut card = CardContent::new(new_card.front, new_card.back);
    card.additional_info = new_card.info;
    card.language = new_card.language;
    card.tags = new_card
        .tags
        .map(|t| {
            t.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    app.store.insert_card(&card).context("Failed to save card")?;
    let placement = lifecycle::add_card_to_deck(&app.store, deck.id, card.id, Utc::now())
        .context("Failed to add card to deck")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "card": card,
                "placement": placement,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Added card {} to '{}'", card.id, deck.name);
        }
    }

    Ok(())
}

pub fn run_remove(app: &App, deck_name: &str, card_id: Uuid) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    lifecycle::remove_card_from_deck(&app.store, deck.id, card_id)
        .context("Failed to remove card")?;
    println!("Removed card {} from '{}'", card_id, deck.name);
    Ok(())
}

pub fn run_rate(app: &App, card_id: Uuid, rating: u8) -> Result<()> {
    app.store
        .set_user_rating(app.user_id, card_id, rating)
        .with_context(|| format!("Failed to rate card {}", card_id))?;
    println!("Rated card {} with {}", card_id, rating);
    Ok(())
}

pub fn run_watch(app: &App, card_id: Uuid) -> Result<()> {
    app.store
        .register_for_notifications(app.user_id, card_id)
        .with_context(|| format!("Failed to watch card {}", card_id))?;
    println!("Watching card {}", card_id);
    Ok(())
}
