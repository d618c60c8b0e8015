mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use heapcards_lib::scheduling::ReviewOutcome;

#[derive(Parser)]
#[command(name = "heapcards-cli", about = "Leitner heap scheduler CLI", version)]
struct Cli {
    /// Configuration file (default: $HEAPCARDS_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Act as this user (default: the local user)
    #[arg(long, global = true)]
    user: Option<Uuid>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Outcome {
    Known,
    Forgotten,
}

impl From<Outcome> for ReviewOutcome {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Known => ReviewOutcome::Known,
            Outcome::Forgotten => ReviewOutcome::Forgotten,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List heap policies and their delays
    Policies,

    /// Deck management
    #[command(subcommand)]
    Deck(DeckCommand),

    /// Card management
    #[command(subcommand)]
    Card(CardCommand),

    /// Record a review
    Review {
        /// Deck name (case-insensitive prefix match) or id
        deck: String,
        card: Uuid,
        outcome: Outcome,
    },

    /// Cards due for review, highest heap first
    Due {
        deck: String,
        #[arg(long, default_value = "20")]
        max: usize,
        /// Comma-separated card ids to leave out
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<Uuid>,
    },

    /// Cards in the unknown heap, never-reviewed first
    Unknown {
        deck: String,
        #[arg(long, default_value = "20")]
        max: usize,
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<Uuid>,
        /// Seed the fairness shuffle for a reproducible order
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Per-heap counts of a deck
    Summary { deck: String },

    /// Summaries of all your decks
    Dashboard,

    /// Page through one heap of a deck
    Browse {
        deck: String,
        heap: u8,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        page: i64,
        #[arg(long, default_value = "20", allow_negative_numbers = true)]
        page_size: i64,
    },

    /// Sample showcase cards
    Demo {
        /// Tag to sample from (default: configured demo tag)
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value = "5")]
        max: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Subcommand)]
enum DeckCommand {
    /// Create a deck
    Create {
        name: String,
        /// Heap policy id (default: configured policy)
        #[arg(long)]
        policy: Option<u32>,
    },
    /// List your decks
    List,
    /// Switch a deck to another heap policy
    Policy { deck: String, policy: u32 },
    /// Delete a deck and all its placements
    Delete { deck: String },
}

#[derive(Subcommand)]
enum CardCommand {
    /// Create a card and put it in a deck
    Add {
        deck: String,
        #[arg(long)]
        front: String,
        #[arg(long)]
        back: String,
        #[arg(long, default_value = "")]
        info: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long, default_value = "")]
        language: String,
    },
    /// Take a card out of a deck
    Remove { deck: String, card: Uuid },
    /// Rate a card from 1 to 5
    Rate {
        card: Uuid,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
    },
    /// Register for notifications about a card
    Watch { card: Uuid },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let format = &cli.format;

    // Listing policies needs no database
    if let Command::Policies = cli.command {
        return commands::policies::run(format, use_color);
    }

    let app = app::App::new(cli.config.as_deref(), cli.db.as_deref(), cli.user)?;

    match cli.command {
        Command::Policies => unreachable!(),
        Command::Deck(DeckCommand::Create { name, policy }) => {
            commands::deck::run_create(&app, &name, policy, format)?;
        }
        Command::Deck(DeckCommand::List) => commands::deck::run_list(&app, format)?,
        Command::Deck(DeckCommand::Policy { deck, policy }) => {
            commands::deck::run_policy(&app, &deck, policy, format)?;
        }
        Command::Deck(DeckCommand::Delete { deck }) => commands::deck::run_delete(&app, &deck)?,
        Command::Card(CardCommand::Add { deck, front, back, info, tags, language }) => {
            let new_card = commands::card::NewCard {
                front,
                back,
                info,
                tags: tags.as_deref(),
                language,
            };
            commands::card::run_add(&app, &deck, new_card, format)?;
        }
        Command::Card(CardCommand::Remove { deck, card }) => {
            commands::card::run_remove(&app, &deck, card)?;
        }
        Command::Card(CardCommand::Rate { card, rating }) => {
            commands::card::run_rate(&app, card, rating)?;
        }
        Command::Card(CardCommand::Watch { card }) => commands::card::run_watch(&app, card)?,
        Command::Review { deck, card, outcome } => {
            commands::review::run(&app, &deck, card, outcome.into(), format, use_color)?;
        }
        Command::Due { deck, max, exclude } => {
            commands::select::run_due(&app, &deck, max, exclude, format, use_color)?;
        }
        Command::Unknown { deck, max, exclude, seed } => {
            commands::select::run_unknown(&app, &deck, max, exclude, seed, format, use_color)?;
        }
        Command::Summary { deck } => commands::report::run_summary(&app, &deck, format, use_color)?,
        Command::Dashboard => commands::report::run_dashboard(&app, format, use_color)?,
        Command::Browse { deck, heap, page, page_size } => {
            commands::report::run_browse(&app, &deck, heap, page, page_size, format, use_color)?;
        }
        Command::Demo { tag, max, seed } => {
            commands::demo::run(&app, tag.as_deref(), max, seed, format, use_color)?;
        }
    }

    Ok(())
}
