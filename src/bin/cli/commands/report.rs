use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use heapcards_lib::scheduling::{browse_heap, summarize, summarize_owner, DeckHeapSummary, Heap, PageRequest};

use crate::app::App;
use crate::render::terminal::{self, paint, Color};
use crate::OutputFormat;

pub fn run_summary(app: &App, deck_name: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let now = Utc::now();
    let summary = summarize(&app.store, deck.id, now).context("Failed to summarize deck")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Plain => print_summary(&summary, now, use_color),
    }

    Ok(())
}

pub fn run_dashboard(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let now = Utc::now();
    let summaries = summarize_owner(&app.store, app.user_id, now)
        .context("Failed to summarize decks")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Plain => {
            if summaries.is_empty() {
                println!("No decks found.");
                return Ok(());
            }
            for summary in &summaries {
                print_summary(summary, now, use_color);
                println!();
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &DeckHeapSummary, now: DateTime<Utc>, use_color: bool) {
    println!(
        "{} {}",
        paint(&summary.deck_name, Color::BOLD, use_color),
        paint(
            &format!("({} cards, {} to review)", summary.total_cards(), summary.expired_cards()),
            Color::DIM,
            use_color
        )
    );
    println!("  Unknown: {}", summary.unknown_count);

    if summary.heaps.is_empty() {
        println!("  No learnt cards yet.");
        return;
    }

    println!("  {:<6} {:>6} {:>8}  Next", "Heap", "Cards", "Expired");
    println!("  {}", "\u{2500}".repeat(34));
    for (heap, stats) in &summary.heaps {
        let expired = if stats.expired > 0 {
            paint(&format!("{:>8}", stats.expired), Color::YELLOW, use_color)
        } else {
            format!("{:>8}", stats.expired)
        };
        println!(
            "  {:<6} {:>6} {}  {}",
            heap.to_string(),
            stats.total,
            expired,
            terminal::describe_expiry(&stats.next_expiry, now)
        );
    }
}

pub fn run_browse(
    app: &App,
    deck_name: &str,
    heap: u8,
    page: i64,
    page_size: i64,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let heap = Heap::new(heap)?;
    let request = PageRequest::new(page, page_size)?;
    let page = browse_heap(&app.store, deck.id, heap, request).context("Failed to browse heap")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Plain => {
            if page.items.is_empty() {
                println!("No cards on this page of heap {}.", heap);
                return Ok(());
            }
            let now = Utc::now();
            for card in &page.items {
                println!("{}", terminal::render_selected(card, now, use_color));
            }
            println!(
                "\nPage {} of {} ({} cards in heap {})",
                page.page + 1,
                page.page_count(),
                page.total,
                heap
            );
        }
    }

    Ok(())
}
