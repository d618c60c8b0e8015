use anyhow::{Context, Result};
use chrono::Utc;

use heapcards_lib::scheduling::{lifecycle, HeapPolicy};

use crate::app::App;
use crate::OutputFormat;

pub fn run_create(app: &App, name: &str, policy: Option<u32>, format: &OutputFormat) -> Result<()> {
    let policy_id = policy.unwrap_or(app.config.default_heap_policy);
    let deck = lifecycle::create_deck(&app.store, app.user_id, name, policy_id, Utc::now())
        .context("Failed to create deck")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deck)?),
        OutputFormat::Plain => println!("Created deck '{}' ({})", deck.name, deck.id),
    }

    Ok(())
}

pub fn run_list(app: &App, format: &OutputFormat) -> Result<()> {
    let decks = app.list_decks()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&decks)?),
        OutputFormat::Plain => {
            if decks.is_empty() {
                println!("No decks found.");
                return Ok(());
            }

            let max_name_len = decks.iter().map(|d| d.name.len()).max().unwrap_or(4).max(4);

            println!("{:<width$} Policy", "Deck", width = max_name_len + 1);
            println!("{} {}", "\u{2500}".repeat(max_name_len + 1), "\u{2500}".repeat(12));

            for deck in &decks {
                let policy = HeapPolicy::from_id(deck.heap_policy_id)
                    .map(|p| p.name.to_string())
                    .unwrap_or_else(|_| format!("unknown ({})", deck.heap_policy_id));
                println!("{:<width$} {}", deck.name, policy, width = max_name_len + 1);
            }

            println!("\n{} decks total", decks.len());
        }
    }

    Ok(())
}

pub fn run_policy(app: &App, deck_name: &str, policy_id: u32, format: &OutputFormat) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let deck = lifecycle::change_deck_policy(&app.store, deck.id, policy_id)
        .context("Failed to change heap policy")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deck)?),
        OutputFormat::Plain => {
            let policy = HeapPolicy::from_id(policy_id)?;
            println!("Deck '{}' now uses policy '{}'", deck.name, policy.name);
            println!("Existing cards keep their due dates until their next review.");
        }
    }

    Ok(())
}

pub fn run_delete(app: &App, deck_name: &str) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    lifecycle::delete_deck(&app.store, deck.id).context("Failed to delete deck")?;
    println!("Deleted deck '{}'", deck.name);
    Ok(())
}
