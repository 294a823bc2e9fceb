//! Shared pagination query parameters.

use serde::Deserialize;
use utoipa::IntoParams;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// Page-based pagination parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct Pagination {
    /// 1-based page number
    pub page: Option<i64>,
    /// Page size (clamped to 100)
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit() - 1) / self.limit()
    }
}
