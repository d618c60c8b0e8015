//! Spaced repetition scheduling for Leitner heaps
//!
//! This module provides:
//! - Heap delay policies, resolved by id per deck
//! - Card placements and their review transitions
//! - Due and unknown card selection
//! - Per-heap deck summaries and paged heap browsing
//! - Fairness shuffling shared with the demo sampler

pub mod browse;
pub mod due;
pub mod enrich;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod placement;
pub mod policy;
pub mod review;
pub mod shuffle;
pub mod sources;
pub mod summary;
pub mod unknown;

#[cfg(test)]
pub(crate) mod testing;

pub use browse::{browse_heap, Page, PageRequest};
pub use due::DueCardSelector;
pub use error::{Result, SchedulingError};
pub use models::*;
pub use placement::CardPlacement;
pub use policy::HeapPolicy;
pub use review::{ReviewOutcome, ReviewRecorder};
pub use shuffle::{IdentityShuffler, RandomShuffler, Shuffler};
pub use summary::{summarize, summarize_owner, DeckHeapSummary, HeapStats, NextExpiry};
pub use unknown::UnknownCardSelector;
