//! Heap delay policies
//!
//! A policy maps a target heap and the instant of the review that put the card
//! there to the instant the card becomes due again. Policies are pure: they
//! never read the clock, so a deck can be pointed at the deterministic policy
//! in tests without touching selection code.
//!
//! Catalog:
//! - 0 `fixed-daily`: heap `h` waits `h` days
//! - 1 `exponential`: heap `h` waits `2^(h-1)` days

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Serialize;

use super::error::{Result, SchedulingError};
use super::models::{DueAt, Heap};

pub const FIXED_DAILY_POLICY_ID: u32 = 0;
pub const EXPONENTIAL_POLICY_ID: u32 = 1;

/// Policy assigned to decks that do not pick one
pub const DEFAULT_POLICY_ID: u32 = EXPONENTIAL_POLICY_ID;

/// A named delay formula
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapPolicy {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    delay: fn(Heap) -> Duration,
}

static CATALOG: [HeapPolicy; 2] = [
    HeapPolicy {
        id: FIXED_DAILY_POLICY_ID,
        name: "fixed-daily",
        description: "Heap n waits n days",
        delay: fixed_daily_delay,
    },
    HeapPolicy {
        id: EXPONENTIAL_POLICY_ID,
        name: "exponential",
        description: "Delay doubles with every heap, starting at one day",
        delay: exponential_delay,
    },
];

fn fixed_daily_delay(heap: Heap) -> Duration {
    Duration::days(i64::from(heap.value()))
}

fn exponential_delay(heap: Heap) -> Duration {
    // heap <= MAX_HEAP keeps the shift well inside i64
    Duration::days(1i64 << (heap.value().saturating_sub(1)))
}

impl HeapPolicy {
    /// Look up a policy by id
    pub fn from_id(id: u32) -> Result<&'static HeapPolicy> {
        CATALOG.iter().find(|p| p.id == id).ok_or_else(|| {
            SchedulingError::Configuration(format!("unknown heap policy id {}", id))
        })
    }

    /// Every registered policy, by id
    pub fn catalog() -> &'static [HeapPolicy] {
        &CATALOG
    }

    /// Delay between a review into `heap` and the next due instant
    pub fn delay(&self, heap: Heap) -> Option<Duration> {
        if heap.is_unknown() {
            None
        } else {
            Some((self.delay)(heap))
        }
    }

    /// Compute when a card placed into `heap` at `last_review` is due again
    pub fn due_at(&self, heap: Heap, last_review: DateTime<Utc>) -> DueAt {
        match self.delay(heap) {
            None => DueAt::Always,
            Some(delay) => DueAt::At(
                last_review
                    .checked_add_signed(delay)
                    .unwrap_or_else(|| DateTime::<Utc>::MAX_UTC.trunc_subsecs(3)),
            ),
        }
    }
}

/// Format a delay as a short human-readable string
pub fn format_delay(delay: Duration) -> String {
    let days = delay.num_days();
    if days == 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn heap(n: u8) -> Heap {
        Heap::new(n).unwrap()
    }

    fn reviewed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_unknown_policy_id() {
        let err = HeapPolicy::from_id(42).unwrap_err();
        assert!(matches!(err, SchedulingError::Configuration(_)));
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let catalog = HeapPolicy::catalog();
        for (i, policy) in catalog.iter().enumerate() {
            assert!(catalog[i + 1..].iter().all(|other| other.id != policy.id));
        }
        assert!(HeapPolicy::from_id(DEFAULT_POLICY_ID).is_ok());
    }

    #[test]
    fn test_heap_zero_is_always_due() {
        for policy in HeapPolicy::catalog() {
            assert_eq!(policy.due_at(Heap::UNKNOWN, reviewed()), DueAt::Always);
        }
    }

    #[test]
    fn test_fixed_daily() {
        let policy = HeapPolicy::from_id(FIXED_DAILY_POLICY_ID).unwrap();
        assert_eq!(
            policy.due_at(heap(3), reviewed()),
            DueAt::At(reviewed() + Duration::days(3))
        );
    }

    #[test]
    fn test_exponential() {
        let policy = HeapPolicy::from_id(EXPONENTIAL_POLICY_ID).unwrap();
        assert_eq!(
            policy.due_at(heap(1), reviewed()),
            DueAt::At(reviewed() + Duration::days(1))
        );
        assert_eq!(
            policy.due_at(heap(4), reviewed()),
            DueAt::At(reviewed() + Duration::days(8))
        );
        assert_eq!(
            policy.due_at(Heap::MAX, reviewed()),
            DueAt::At(reviewed() + Duration::days(16384))
        );
    }

    #[test]
    fn test_due_saturates_on_overflow() {
        let policy = HeapPolicy::from_id(EXPONENTIAL_POLICY_ID).unwrap();
        let late = DateTime::<Utc>::MAX_UTC - Duration::days(1);
        assert_eq!(
            policy.due_at(Heap::MAX, late),
            DueAt::At(DateTime::<Utc>::MAX_UTC.trunc_subsecs(3))
        );
    }

    #[test]
    fn test_format_delay() {
        assert_eq!(format_delay(Duration::zero()), "now");
        assert_eq!(format_delay(Duration::days(1)), "1d");
        assert_eq!(format_delay(Duration::days(14)), "2w");
        assert_eq!(format_delay(Duration::days(64)), "2mo");
        assert_eq!(format_delay(Duration::days(16384)), "44y");
    }
}
