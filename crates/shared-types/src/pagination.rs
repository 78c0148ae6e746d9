//! # Pagination
//!
//! Offset/limit pagination for list operations.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PaginationError;

/// Default page size when the caller does not supply one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Sort direction on `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(PaginationError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// Page request (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub sort_order: SortOrder,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort_order: SortOrder::Asc,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            sort_order: SortOrder::Asc,
        }
    }

    pub fn descending(mut self) -> Self {
        self.sort_order = SortOrder::Desc;
        self
    }

    /// Check the page is 1-based and the limit is within `1..=max_limit`.
    pub fn validate(&self, max_limit: u32) -> Result<(), PaginationError> {
        if self.page == 0 {
            return Err(PaginationError::InvalidPage(self.page));
        }
        if self.limit == 0 || self.limit > max_limit {
            return Err(PaginationError::InvalidLimit {
                limit: self.limit,
                max: max_limit,
            });
        }
        Ok(())
    }

    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pagination() {
        let p = Pagination::default();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Pagination::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_validate_bounds() {
        assert!(Pagination::new(1, 100).validate(100).is_ok());
        assert_eq!(
            Pagination::new(0, 10).validate(100),
            Err(PaginationError::InvalidPage(0))
        );
        assert!(Pagination::new(1, 0).validate(100).is_err());
        assert!(Pagination::new(1, 101).validate(100).is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
