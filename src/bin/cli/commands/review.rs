use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use heapcards_lib::scheduling::{ReviewOutcome, ReviewRecorder};

use crate::app::App;
use crate::render::terminal::{describe_due, paint, Color};
use crate::OutputFormat;

pub fn run(
    app: &App,
    deck_name: &str,
    card_id: Uuid,
    outcome: ReviewOutcome,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck = app.find_deck(deck_name)?;
    let now = Utc::now();
    let placement = ReviewRecorder::new(&app.store)
        .record(deck.id, card_id, outcome, now)
        .context("Failed to record review")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&placement)?),
        OutputFormat::Plain => {
            let heap = paint(&format!("heap {}", placement.heap), Color::CYAN, use_color);
            match outcome {
                ReviewOutcome::Known => println!(
                    "{} Moved to {}, {}",
                    paint("Known.", Color::GREEN, use_color),
                    heap,
                    describe_due(&placement.next_due, now)
                ),
                ReviewOutcome::Forgotten => println!(
                    "{} Back to {} (returned {} times)",
                    paint("Forgotten.", Color::RED, use_color),
                    heap,
                    placement.times_returned_to_unknown
                ),
            }
        }
    }

    Ok(())
}
