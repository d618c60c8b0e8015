//! Data models for the scheduling engine

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{Result, SchedulingError};

/// Highest heap a card can reach
pub const MAX_HEAP: u8 = 15;

/// A Leitner heap. Heap 0 holds unknown cards, `MAX_HEAP` the most mastered ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Heap(u8);

impl Heap {
    pub const UNKNOWN: Heap = Heap(0);
    pub const MAX: Heap = Heap(MAX_HEAP);

    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_HEAP {
            return Err(SchedulingError::InvalidArgument(format!(
                "heap {} is out of range 0..={}",
                value, MAX_HEAP
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_unknown(self) -> bool {
        self.0 == 0
    }

    /// Next heap up, saturating at `MAX_HEAP`
    pub fn promoted(self) -> Heap {
        Heap(self.0.saturating_add(1).min(MAX_HEAP))
    }

    /// Heaps that carry a due date, highest first
    pub fn learnt_descending() -> impl Iterator<Item = Heap> {
        (1..=MAX_HEAP).rev().map(Heap)
    }
}

impl TryFrom<u8> for Heap {
    type Error = SchedulingError;

    fn try_from(value: u8) -> Result<Self> {
        Heap::new(value)
    }
}

impl From<Heap> for u8 {
    fn from(heap: Heap) -> Self {
        heap.0
    }
}

impl fmt::Display for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a placement has ever been reviewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "at", rename_all = "camelCase")]
pub enum ReviewState {
    /// Added to the deck, never reviewed
    Unreviewed,
    /// Last reviewed at this instant
    ReviewedAt(DateTime<Utc>),
}

impl ReviewState {
    pub fn last_review(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Unreviewed => None,
            Self::ReviewedAt(at) => Some(*at),
        }
    }
}

/// When a placement becomes eligible for review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "at", rename_all = "camelCase")]
pub enum DueAt {
    /// Unknown cards are always eligible
    Always,
    At(DateTime<Utc>),
}

impl DueAt {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Always => true,
            Self::At(at) => *at <= now,
        }
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Always => None,
            Self::At(at) => Some(*at),
        }
    }
}

/// Deck configuration consumed by the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub heap_policy_id: u32,
    pub created_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(owner_id: Uuid, name: String, heap_policy_id: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            heap_policy_id,
            created_at: now,
        }
    }
}

/// Card content as read from the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardContent {
    pub id: Uuid,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub additional_info: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub language: String,
    /// Average of all user ratings, 0 when unrated
    #[serde(default)]
    pub average_rating: f64,
}

impl CardContent {
    pub fn new(front: String, back: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            front,
            back,
            additional_info: String::new(),
            tags: Vec::new(),
            language: String::new(),
            average_rating: 0.0,
        }
    }
}

/// Per-user data attached to a selected card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalView {
    /// The user's own rating, 0 when the user never rated the card
    pub rating: u8,
    pub registered_for_notifications: bool,
}

/// A placement joined with its card content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCard {
    pub placement: super::placement::CardPlacement,
    pub content: CardContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal: Option<PersonalView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_heap_range() {
        assert!(Heap::new(0).is_ok());
        assert!(Heap::new(MAX_HEAP).is_ok());
        assert!(matches!(
            Heap::new(MAX_HEAP + 1),
            Err(SchedulingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_heap_promotion_saturates() {
        assert_eq!(Heap::UNKNOWN.promoted(), Heap::new(1).unwrap());
        assert_eq!(Heap::MAX.promoted(), Heap::MAX);
    }

    #[test]
    fn test_learnt_heaps_descending() {
        let heaps: Vec<u8> = Heap::learnt_descending().map(Heap::value).collect();
        assert_eq!(heaps.len(), MAX_HEAP as usize);
        assert_eq!(heaps.first(), Some(&MAX_HEAP));
        assert_eq!(heaps.last(), Some(&1));
    }

    #[test]
    fn test_heap_deserialize_rejects_out_of_range() {
        let heap: Heap = serde_json::from_str("4").unwrap();
        assert_eq!(heap.value(), 4);
        assert!(serde_json::from_str::<Heap>("16").is_err());
    }

    #[test]
    fn test_due_at() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert!(DueAt::Always.is_due(now));
        assert!(DueAt::At(now).is_due(now));
        assert!(!DueAt::At(now + chrono::Duration::seconds(1)).is_due(now));
    }
}
