//! Paged listing of one heap

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enrich::join_content;
use super::error::{Result, SchedulingError};
use super::models::{Heap, SelectedCard};
use super::sources::{CardContentStore, DeckConfigStore, PlacementSource};

/// Largest page a caller may ask for
pub const MAX_PAGE_SIZE: usize = 200;

/// A validated page request (zero-based page index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Build from raw transport values
    pub fn new(page: i64, page_size: i64) -> Result<Self> {
        let page = usize::try_from(page).map_err(|_| {
            SchedulingError::InvalidArgument(format!("page must not be negative, got {}", page))
        })?;
        let page_size = usize::try_from(page_size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                SchedulingError::InvalidArgument(format!(
                    "page size must be positive, got {}",
                    page_size
                ))
            })?;

        Ok(Self {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size.max(1))
    }
}

/// Cards of `heap` in review order, one page at a time
pub fn browse_heap<S>(
    store: &S,
    deck_id: Uuid,
    heap: Heap,
    request: PageRequest,
) -> Result<Page<SelectedCard>>
where
    S: DeckConfigStore + PlacementSource + CardContentStore + ?Sized,
{
    if store.deck(deck_id)?.is_none() {
        return Err(SchedulingError::DeckNotFound(deck_id));
    }

    let (placements, total) =
        store.heap_page(deck_id, heap, request.offset(), request.page_size)?;

    Ok(Page {
        items: join_content(store, placements)?,
        page: request.page,
        page_size: request.page_size,
        total,
    })
}
