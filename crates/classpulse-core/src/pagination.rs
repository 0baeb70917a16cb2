//! Page-based pagination for list endpoints.
//!
//! Clients send `page` (1-indexed, default 1) and `limit` (1-100, default 25).
//! Responses echo the effective `{page, limit}` and carry `next`/`prev` cursors
//! derived from the total row count, so clients never compute page math:
//!
//! ```json
//! "pagination": { "page": 2, "limit": 10, "next": { "page": 3, "limit": 10 }, "prev": { "page": 1, "limit": 10 } }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 25;
pub const MAX_LIMIT: i64 = 100;
/// Highest page whose offset still fits in an i64 at any limit.
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// Deserializes an optional string into an optional i64.
///
/// Query parameters arrive as strings and may be empty, which is treated as `None`.
pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 25)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageCursor {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageCursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageCursor>,
}

impl Pagination {
    #[must_use]
    pub fn from_total(params: &PaginationParams, total: i64) -> Self {
        let page = params.page();
        let limit = params.limit();
        let end_index = page * limit;

        let next = (end_index < total).then_some(PageCursor {
            page: page + 1,
            limit,
        });
        let prev = (params.offset() > 0).then_some(PageCursor {
            page: page - 1,
            limit,
        });

        Self {
            page,
            limit,
            next,
            prev,
        }
    }
}
