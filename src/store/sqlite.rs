//! SQLite-backed implementation of every scheduler source.
//!
//! Instants are stored as integer milliseconds so that ordering and due
//! comparisons happen in SQL. `NULL` in `last_review_at` means the card was
//! never reviewed; `NULL` in `next_due_at` means always due.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::scheduling::models::{CardContent, Deck, DueAt, Heap, ReviewState};
use crate::scheduling::placement::CardPlacement;
use crate::scheduling::sources::{
    CardContentStore, DeckConfigStore, NotificationStore, PlacementSource, PlacementWriter,
    UserRatingStore,
};

/// Upper bound on ids bound into a single `IN (...)` list
const MAX_IN_LIST: usize = 500;

const PLACEMENT_COLUMNS: &str = "deck_id, card_id, heap, last_review_at, next_due_at, \
     highest_heap, times_returned_to_unknown, added_at";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS decks (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        name TEXT NOT NULL,
        heap_policy_id INTEGER NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cards (
        id TEXT PRIMARY KEY,
        front TEXT NOT NULL,
        back TEXT NOT NULL,
        additional_info TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '[]',
        language TEXT NOT NULL DEFAULT '',
        average_rating REAL NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS placements (
        deck_id TEXT NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
        card_id TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
        heap INTEGER NOT NULL CHECK (heap BETWEEN 0 AND 15),
        last_review_at INTEGER,
        next_due_at INTEGER,
        highest_heap INTEGER NOT NULL,
        times_returned_to_unknown INTEGER NOT NULL DEFAULT 0,
        added_at INTEGER NOT NULL,
        PRIMARY KEY (deck_id, card_id)
    );

    CREATE TABLE IF NOT EXISTS user_ratings (
        user_id TEXT NOT NULL,
        card_id TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
        rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
        PRIMARY KEY (user_id, card_id)
    );

    CREATE TABLE IF NOT EXISTS notification_registrations (
        user_id TEXT NOT NULL,
        card_id TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, card_id)
    );

    CREATE INDEX IF NOT EXISTS idx_placements_due ON placements(deck_id, heap, next_due_at);
    CREATE INDEX IF NOT EXISTS idx_placements_added ON placements(deck_id, heap, added_at);
    CREATE INDEX IF NOT EXISTS idx_decks_owner ON decks(owner_id);
"#;

/// Scheduler storage in a single SQLite database
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: &Path) -> StoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        log::debug!("Opened scheduler database at {}", db_path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ==================== Deck Operations ====================

    pub fn insert_deck(&self, deck: &Deck) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO decks (id, owner_id, name, heap_policy_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                deck.id.to_string(),
                deck.owner_id.to_string(),
                deck.name,
                deck.heap_policy_id,
                deck.created_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    /// Returns false when the deck does not exist
    pub fn update_deck_policy(&self, deck_id: Uuid, heap_policy_id: u32) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE decks SET heap_policy_id = ?1 WHERE id = ?2",
            params![heap_policy_id, deck_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    /// Delete a deck; its placements go with it
    pub fn delete_deck(&self, deck_id: Uuid) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM decks WHERE id = ?1", params![deck_id.to_string()])?;
        Ok(changed > 0)
    }

    pub fn list_decks(&self) -> StoreResult<Vec<Deck>> {
        self.query_decks(
            "SELECT id, owner_id, name, heap_policy_id, created_at FROM decks ORDER BY name, id",
            Vec::new(),
        )
    }

    // ==================== Card Operations ====================

    pub fn insert_card(&self, card: &CardContent) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO cards (id, front, back, additional_info, tags, language, average_rating) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                card.id.to_string(),
                card.front,
                card.back,
                card.additional_info,
                serde_json::to_string(&card.tags)?,
                card.language,
                card.average_rating,
            ],
        )?;
        Ok(())
    }

    pub fn card_exists(&self, card_id: Uuid) -> StoreResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM cards WHERE id = ?1",
                params![card_id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Record a user's rating (1-5) and refresh the card's average
    pub fn set_user_rating(&self, user_id: Uuid, card_id: Uuid, rating: u8) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO user_ratings (user_id, card_id, rating) VALUES (?1, ?2, ?3)",
            params![user_id.to_string(), card_id.to_string(), rating],
        )?;
        tx.execute(
            "UPDATE cards SET average_rating = \
             (SELECT COALESCE(AVG(rating), 0) FROM user_ratings WHERE card_id = ?1) \
             WHERE id = ?1",
            params![card_id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn register_for_notifications(&self, user_id: Uuid, card_id: Uuid) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO notification_registrations (user_id, card_id) VALUES (?1, ?2)",
            params![user_id.to_string(), card_id.to_string()],
        )?;
        Ok(())
    }

    // ==================== Placement Operations ====================

    pub fn insert_placement(&self, placement: &CardPlacement) -> StoreResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO placements ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                PLACEMENT_COLUMNS
            ),
            params![
                placement.deck_id.to_string(),
                placement.card_id.to_string(),
                placement.heap.value(),
                placement.review.last_review().map(|t| t.timestamp_millis()),
                placement.next_due.instant().map(|t| t.timestamp_millis()),
                placement.highest_heap_reached.value(),
                placement.times_returned_to_unknown,
                placement.added_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    /// Returns false when the card was not in the deck
    pub fn delete_placement(&self, deck_id: Uuid, card_id: Uuid) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM placements WHERE deck_id = ?1 AND card_id = ?2",
            params![deck_id.to_string(), card_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    // ==================== Query Helpers ====================

    fn query_placements(&self, sql: &str, values: Vec<Value>) -> StoreResult<Vec<CardPlacement>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), PlacementRow::from_row)?;

        let mut placements = Vec::new();
        for row in rows {
            placements.push(row?.into_placement()?);
        }
        Ok(placements)
    }

    fn query_decks(&self, sql: &str, values: Vec<Value>) -> StoreResult<Vec<Deck>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut decks = Vec::new();
        for row in rows {
            let (id, owner_id, name, heap_policy_id, created_at) = row?;
            decks.push(Deck {
                id: parse_uuid(&id)?,
                owner_id: parse_uuid(&owner_id)?,
                name,
                heap_policy_id,
                created_at: from_millis(created_at)?,
            });
        }
        Ok(decks)
    }
}

// ==================== Row Mapping ====================

struct PlacementRow {
    deck_id: String,
    card_id: String,
    heap: i64,
    last_review_at: Option<i64>,
    next_due_at: Option<i64>,
    highest_heap: i64,
    times_returned_to_unknown: i64,
    added_at: i64,
}

impl PlacementRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            deck_id: row.get(0)?,
            card_id: row.get(1)?,
            heap: row.get(2)?,
            last_review_at: row.get(3)?,
            next_due_at: row.get(4)?,
            highest_heap: row.get(5)?,
            times_returned_to_unknown: row.get(6)?,
            added_at: row.get(7)?,
        })
    }

    fn into_placement(self) -> StoreResult<CardPlacement> {
        let heap = parse_heap(self.heap)?;
        let review = match self.last_review_at {
            None => ReviewState::Unreviewed,
            Some(ms) => ReviewState::ReviewedAt(from_millis(ms)?),
        };
        let next_due = match (heap.is_unknown(), self.next_due_at) {
            (true, _) => DueAt::Always,
            (false, Some(ms)) => DueAt::At(from_millis(ms)?),
            (false, None) => {
                return Err(StoreError::InvalidData(format!(
                    "card {} in heap {} has no due date",
                    self.card_id, heap
                )))
            }
        };

        Ok(CardPlacement {
            deck_id: parse_uuid(&self.deck_id)?,
            card_id: parse_uuid(&self.card_id)?,
            heap,
            review,
            next_due,
            highest_heap_reached: parse_heap(self.highest_heap)?,
            times_returned_to_unknown: u32::try_from(self.times_returned_to_unknown).map_err(
                |_| StoreError::InvalidData(format!("negative counter for card {}", self.card_id)),
            )?,
            added_at: from_millis(self.added_at)?,
        })
    }
}

fn parse_uuid(raw: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StoreError::InvalidData(format!("bad id {}: {}", raw, e)))
}

fn parse_heap(raw: i64) -> StoreResult<Heap> {
    u8::try_from(raw)
        .ok()
        .and_then(|v| Heap::new(v).ok())
        .ok_or_else(|| StoreError::InvalidData(format!("heap {} out of range", raw)))
}

fn from_millis(ms: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::InvalidData(format!("timestamp {} out of range", ms)))
}

fn sql_limit(limit: usize) -> Value {
    Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX))
}

/// ` AND card_id NOT IN (?, ...)` for a non-empty exclusion set
fn exclusion_clause(excluded: &HashSet<Uuid>, values: &mut Vec<Value>) -> String {
    if excluded.is_empty() {
        return String::new();
    }
    let placeholders: Vec<&str> = excluded
        .iter()
        .map(|id| {
            values.push(Value::Text(id.to_string()));
            "?"
        })
        .collect();
    format!(" AND card_id NOT IN ({})", placeholders.join(", "))
}

fn in_list(ids: &[Uuid], values: &mut Vec<Value>) -> String {
    let placeholders: Vec<&str> = ids
        .iter()
        .map(|id| {
            values.push(Value::Text(id.to_string()));
            "?"
        })
        .collect();
    placeholders.join(", ")
}

// ==================== Source Implementations ====================

impl DeckConfigStore for SqliteStore {
    fn deck(&self, deck_id: Uuid) -> StoreResult<Option<Deck>> {
        let mut decks = self.query_decks(
            "SELECT id, owner_id, name, heap_policy_id, created_at FROM decks WHERE id = ?",
            vec![Value::Text(deck_id.to_string())],
        )?;
        Ok(decks.pop())
    }

    fn decks_of_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Deck>> {
        self.query_decks(
            "SELECT id, owner_id, name, heap_policy_id, created_at FROM decks \
             WHERE owner_id = ? ORDER BY name, id",
            vec![Value::Text(owner_id.to_string())],
        )
    }
}

impl CardContentStore for SqliteStore {
    fn cards_by_ids(&self, card_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, CardContent>> {
        let mut cards = HashMap::with_capacity(card_ids.len());

        for chunk in card_ids.chunks(MAX_IN_LIST) {
            let mut values = Vec::with_capacity(chunk.len());
            let sql = format!(
                "SELECT id, front, back, additional_info, tags, language, average_rating \
                 FROM cards WHERE id IN ({})",
                in_list(chunk, &mut values)
            );
            for card in query_cards(&self.conn, &sql, values)? {
                cards.insert(card.id, card);
            }
        }

        Ok(cards)
    }

    fn cards_with_tag(&self, tag: &str, limit: usize) -> StoreResult<Vec<CardContent>> {
        query_cards(
            &self.conn,
            "SELECT id, front, back, additional_info, tags, language, average_rating FROM cards c \
             WHERE EXISTS (SELECT 1 FROM json_each(c.tags) WHERE json_each.value = ?) \
             ORDER BY average_rating DESC, id LIMIT ?",
            vec![Value::Text(tag.to_string()), sql_limit(limit)],
        )
    }
}

fn query_cards(conn: &Connection, sql: &str, values: Vec<Value>) -> StoreResult<Vec<CardContent>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, f64>(6)?,
        ))
    })?;

    let mut cards = Vec::new();
    for row in rows {
        let (id, front, back, additional_info, tags, language, average_rating) = row?;
        cards.push(CardContent {
            id: parse_uuid(&id)?,
            front,
            back,
            additional_info,
            tags: serde_json::from_str(&tags)?,
            language,
            average_rating,
        });
    }
    Ok(cards)
}

impl UserRatingStore for SqliteStore {
    fn user_ratings(&self, user_id: Uuid, card_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, u8>> {
        let mut ratings = HashMap::new();

        for chunk in card_ids.chunks(MAX_IN_LIST) {
            let mut values = vec![Value::Text(user_id.to_string())];
            let sql = format!(
                "SELECT card_id, rating FROM user_ratings WHERE user_id = ? AND card_id IN ({})",
                in_list(chunk, &mut values)
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (card_id, rating) = row?;
                let rating = u8::try_from(rating)
                    .map_err(|_| StoreError::InvalidData(format!("rating {} out of range", rating)))?;
                ratings.insert(parse_uuid(&card_id)?, rating);
            }
        }

        Ok(ratings)
    }
}

impl NotificationStore for SqliteStore {
    fn registered_cards(&self, user_id: Uuid, card_ids: &[Uuid]) -> StoreResult<HashSet<Uuid>> {
        let mut registered = HashSet::new();

        for chunk in card_ids.chunks(MAX_IN_LIST) {
            let mut values = vec![Value::Text(user_id.to_string())];
            let sql = format!(
                "SELECT card_id FROM notification_registrations WHERE user_id = ? AND card_id IN ({})",
                in_list(chunk, &mut values)
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?;
            for row in rows {
                registered.insert(parse_uuid(&row?)?);
            }
        }

        Ok(registered)
    }
}

impl PlacementSource for SqliteStore {
    fn due_in_heap(
        &self,
        deck_id: Uuid,
        heap: Heap,
        now: DateTime<Utc>,
        excluded: &HashSet<Uuid>,
        limit: usize,
    ) -> StoreResult<Vec<CardPlacement>> {
        let mut values = vec![
            Value::Text(deck_id.to_string()),
            Value::Integer(i64::from(heap.value())),
            Value::Integer(now.timestamp_millis()),
        ];
        let exclusion = exclusion_clause(excluded, &mut values);
        values.push(sql_limit(limit));

        let sql = format!(
            "SELECT {} FROM placements \
             WHERE deck_id = ? AND heap = ? AND next_due_at IS NOT NULL AND next_due_at <= ?{} \
             ORDER BY next_due_at ASC, card_id ASC LIMIT ?",
            PLACEMENT_COLUMNS, exclusion
        );
        self.query_placements(&sql, values)
    }

    fn never_reviewed(
        &self,
        deck_id: Uuid,
        excluded: &HashSet<Uuid>,
        limit: usize,
    ) -> StoreResult<Vec<CardPlacement>> {
        let mut values = vec![Value::Text(deck_id.to_string())];
        let exclusion = exclusion_clause(excluded, &mut values);
        values.push(sql_limit(limit));

        let sql = format!(
            "SELECT {} FROM placements \
             WHERE deck_id = ? AND heap = 0 AND last_review_at IS NULL{} \
             ORDER BY added_at ASC, card_id ASC LIMIT ?",
            PLACEMENT_COLUMNS, exclusion
        );
        self.query_placements(&sql, values)
    }

    fn demoted_to_unknown(
        &self,
        deck_id: Uuid,
        excluded: &HashSet<Uuid>,
        limit: usize,
    ) -> StoreResult<Vec<CardPlacement>> {
        let mut values = vec![Value::Text(deck_id.to_string())];
        let exclusion = exclusion_clause(excluded, &mut values);
        values.push(sql_limit(limit));

        let sql = format!(
            "SELECT {} FROM placements \
             WHERE deck_id = ? AND heap = 0 AND last_review_at IS NOT NULL{} \
             ORDER BY last_review_at ASC, card_id ASC LIMIT ?",
            PLACEMENT_COLUMNS, exclusion
        );
        self.query_placements(&sql, values)
    }

    fn deck_placements(&self, deck_id: Uuid) -> StoreResult<Vec<CardPlacement>> {
        self.query_placements(
            &format!(
                "SELECT {} FROM placements WHERE deck_id = ? ORDER BY heap, card_id",
                PLACEMENT_COLUMNS
            ),
            vec![Value::Text(deck_id.to_string())],
        )
    }

    fn heap_page(
        &self,
        deck_id: Uuid,
        heap: Heap,
        offset: usize,
        limit: usize,
    ) -> StoreResult<(Vec<CardPlacement>, usize)> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM placements WHERE deck_id = ?1 AND heap = ?2",
            params![deck_id.to_string(), heap.value()],
            |row| row.get(0),
        )?;

        let rows = self.query_placements(
            &format!(
                "SELECT {} FROM placements WHERE deck_id = ? AND heap = ? \
                 ORDER BY COALESCE(next_due_at, added_at) ASC, card_id ASC LIMIT ? OFFSET ?",
                PLACEMENT_COLUMNS
            ),
            vec![
                Value::Text(deck_id.to_string()),
                Value::Integer(i64::from(heap.value())),
                sql_limit(limit),
                sql_limit(offset),
            ],
        )?;

        let total = usize::try_from(total)
            .map_err(|_| StoreError::InvalidData(format!("negative count {}", total)))?;
        Ok((rows, total))
    }

    fn placement(&self, deck_id: Uuid, card_id: Uuid) -> StoreResult<Option<CardPlacement>> {
        let mut rows = self.query_placements(
            &format!(
                "SELECT {} FROM placements WHERE deck_id = ? AND card_id = ?",
                PLACEMENT_COLUMNS
            ),
            vec![
                Value::Text(deck_id.to_string()),
                Value::Text(card_id.to_string()),
            ],
        )?;
        Ok(rows.pop())
    }
}

impl PlacementWriter for SqliteStore {
    fn save_placement(&self, placement: &CardPlacement) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE placements SET heap = ?1, last_review_at = ?2, next_due_at = ?3, \
             highest_heap = ?4, times_returned_to_unknown = ?5 \
             WHERE deck_id = ?6 AND card_id = ?7",
            params![
                placement.heap.value(),
                placement.review.last_review().map(|t| t.timestamp_millis()),
                placement.next_due.instant().map(|t| t.timestamp_millis()),
                placement.highest_heap_reached.value(),
                placement.times_returned_to_unknown,
                placement.deck_id.to_string(),
                placement.card_id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::RowNotFound(format!(
                "placement of card {} in deck {}",
                placement.card_id, placement.deck_id
            )));
        }
        Ok(())
    }
}
