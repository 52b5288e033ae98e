//! Common types used across the platform

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a stored or submitted enum value is not recognised
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Round a money or hours amount to two decimal places, half away from zero
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    15
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl Pagination {
    /// Largest page size a client may request
    pub const MAX_PER_PAGE: u32 = 100;

    /// Row limit for SQL, clamped to `1..=MAX_PER_PAGE`
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page.clamp(1, Self::MAX_PER_PAGE))
    }

    /// Row offset for SQL; page numbers start at 1
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * self.limit()
    }

    /// Wrap one page of rows with its metadata
    pub fn paginate<T>(&self, data: Vec<T>, total_items: i64) -> PaginatedResponse<T> {
        let per_page = self.limit() as u32;
        let total_items = total_items.max(0) as u64;
        let total_pages = total_items.div_ceil(u64::from(per_page)) as u32;
        PaginatedResponse {
            data,
            pagination: PaginationMeta {
                page: self.page.max(1),
                per_page,
                total_items,
                total_pages,
            },
        }
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

/// Inclusive date range for queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range from optional bounds.
    ///
    /// A missing bound copies the other one, both missing means `today`, and a
    /// reversed range is swapped.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        let (start, end) = match (start, end) {
            (None, None) => (today, today),
            (Some(s), None) => (s, s),
            (None, Some(e)) => (e, e),
            (Some(s), Some(e)) => (s, e),
        };
        if start > end {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round2(Decimal::new(1004, 3)), Decimal::new(100, 2));
    }

    #[test]
    fn test_pagination_offsets() {
        let p = Pagination { page: 3, per_page: 10 };
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 20);

        let zero = Pagination { page: 0, per_page: 0 };
        assert_eq!(zero.limit(), 1);
        assert_eq!(zero.offset(), 0);

        let huge = Pagination { page: 1, per_page: 10_000 };
        assert_eq!(huge.limit(), 100);
    }

    #[test]
    fn test_paginate_total_pages() {
        let p = Pagination { page: 1, per_page: 15 };
        let page = p.paginate(vec![1, 2, 3], 31);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.total_items, 31);
        assert_eq!(page.data.len(), 3);
    }

    #[test]
    fn test_date_range_resolution() {
        let today = date("2025-03-10");
        assert_eq!(
            DateRange::resolve(None, None, today),
            DateRange { start: today, end: today }
        );
        assert_eq!(
            DateRange::resolve(Some(date("2025-03-01")), None, today),
            DateRange { start: date("2025-03-01"), end: date("2025-03-01") }
        );
        let swapped = DateRange::resolve(Some(date("2025-03-09")), Some(date("2025-03-02")), today);
        assert_eq!(swapped.start, date("2025-03-02"));
        assert_eq!(swapped.end, date("2025-03-09"));
        assert!(swapped.contains(date("2025-03-05")));
        assert!(!swapped.contains(date("2025-03-10")));
    }
}
