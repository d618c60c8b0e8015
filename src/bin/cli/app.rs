use std::path::Path;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use heapcards_lib::scheduling::sources::DeckConfigStore;
use heapcards_lib::scheduling::Deck;
use heapcards_lib::{SchedulerConfig, SqliteStore};

/// Shared application state for CLI commands
pub struct App {
    pub config: SchedulerConfig,
    pub store: SqliteStore,
    pub user_id: Uuid,
}

impl App {
    /// Load the configuration and open the database
    pub fn new(config_path: Option<&Path>, db_override: Option<&Path>, user: Option<Uuid>) -> Result<Self> {
        let config = SchedulerConfig::load(config_path).context("Failed to load configuration")?;

        let db_path = match db_override {
            Some(path) => path.to_path_buf(),
            None => config.database_path().context("Failed to resolve database path")?,
        };
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        Ok(Self {
            config,
            store,
            user_id: user.unwrap_or_else(local_user_id),
        })
    }

    /// Decks owned by the current user
    pub fn list_decks(&self) -> Result<Vec<Deck>> {
        self.store
            .decks_of_owner(self.user_id)
            .context("Failed to list decks")
    }

    /// Find a deck by id or by name (case-insensitive prefix match)
    pub fn find_deck(&self, name: &str) -> Result<Deck> {
        let decks = self.list_decks()?;

        if let Ok(id) = Uuid::parse_str(name) {
            if let Some(deck) = decks.iter().find(|d| d.id == id) {
                return Ok(deck.clone());
            }
        }

        let name_lower = name.to_lowercase();

        // Exact match first
        if let Some(deck) = decks.iter().find(|d| d.name.to_lowercase() == name_lower) {
            return Ok(deck.clone());
        }

        // Prefix match
        let matches: Vec<&Deck> = decks
            .iter()
            .filter(|d| d.name.to_lowercase().starts_with(&name_lower))
            .collect();

        match matches.len() {
            0 => bail!(
                "No deck matching '{}'. Available decks:\n{}",
                name,
                decks.iter().map(|d| format!("  - {}", d.name)).collect::<Vec<_>>().join("\n")
            ),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous deck name '{}'. Matches:\n{}",
                name,
                matches.iter().map(|d| format!("  - {}", d.name)).collect::<Vec<_>>().join("\n")
            ),
        }
    }
}

/// Stable id of the single local user when `--user` is not given
fn local_user_id() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, b"heapcards-local-user")
}
