use anyhow::{Context, Result};

use heapcards_lib::demo::DemoCardSampler;
use heapcards_lib::scheduling::RandomShuffler;

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run(
    app: &App,
    tag: Option<&str>,
    max: usize,
    seed: Option<u64>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let tag = tag.unwrap_or(&app.config.demo_tag);
    let sampler = DemoCardSampler::new(&app.store);

    let cards = match seed {
        Some(seed) => sampler.sample(tag, max, &mut RandomShuffler::seeded(seed)),
        None => sampler.sample(tag, max, &mut RandomShuffler::from_thread_rng()),
    }
    .context("Failed to sample demo cards")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cards)?),
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("No cards tagged #{}.", tag);
                return Ok(());
            }
            for card in &cards {
                println!("{}", terminal::render_content(card, use_color));
                println!("    {}", card.back);
            }
        }
    }

    Ok(())
}
