use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use heapcards_lib::scheduling::{DueCardSelector, RandomShuffler, SelectedCard, UnknownCardSelector};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run_due(
    app: &App,
    deck_name: &str,
    max: usize,
    exclude: Vec<Uuid>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let excluded: HashSet<Uuid> = exclude.into_iter().collect();
    let now = Utc::now();

    let cards = DueCardSelector::new(&app.store)
        .select(deck.id, now, &excluded, max)
        .context("Failed to select due cards")?;

    print_cards(&cards, "No cards due.", format, use_color)
}

pub fn run_unknown(
    app: &App,
    deck_name: &str,
    max: usize,
    exclude: Vec<Uuid>,
    seed: Option<u64>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let excluded: HashSet<Uuid> = exclude.into_iter().collect();
    let selector =
        UnknownCardSelector::new(&app.store).with_overfetch(app.config.never_reviewed_overfetch);

    let cards = match seed {
        Some(seed) => selector.select(deck.id, app.user_id, &excluded, max, &mut RandomShuffler::seeded(seed)),
        None => selector.select(deck.id, app.user_id, &excluded, max, &mut RandomShuffler::from_thread_rng()),
    }
    .context("Failed to select unknown cards")?;

    print_cards(&cards, "No cards in the unknown heap.", format, use_color)
}

fn print_cards(cards: &[SelectedCard], empty: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(cards)?),
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("{}", empty);
                return Ok(());
            }
            let now = Utc::now();
            for card in cards {
                println!("{}", terminal::render_selected(card, now, use_color));
            }
        }
    }
    Ok(())
}
