//! Common types shared across models.

use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

/// `?page=&limit=` query parameters for paginated admin lists
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Page size, clamped to `1..=500`
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset for a 1-based page number
    pub fn offset(&self) -> i64 {
        let page = self.page.unwrap_or(1).max(1);
        (page - 1).saturating_mul(self.limit())
    }
}

/// A page of rows plus the unpaginated row count
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub success: bool,
    pub items: Vec<T>,
    pub total_count: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64) -> Self {
        Self {
            success: true,
            items,
            total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults() {
        let query = PageQuery::default();
        assert_eq!(query.limit(), 50);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_page_query_offset() {
        let query = PageQuery {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn test_page_query_clamps() {
        let query = PageQuery {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(query.limit(), 500);
        assert_eq!(query.offset(), 0);

        let query = PageQuery {
            page: Some(-4),
            limit: Some(0),
        };
        assert_eq!(query.limit(), 1);
        assert_eq!(query.offset(), 0);

        let query = PageQuery {
            page: Some(i64::MAX),
            limit: Some(500),
        };
        assert_eq!(query.offset(), i64::MAX);
    }
}
