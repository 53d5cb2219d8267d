use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

/// Query-string paging, shared by every list endpoint.
///
/// List query structs carry `page` and `limit` as their own fields (axum's
/// `Query` cannot deserialize numbers through `#[serde(flatten)]`) and build
/// this from them.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PaginationParams {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self { page, limit }
    }

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Standard paged list envelope.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: &PaginationParams) -> Self {
        Self {
            items,
            total,
            page: pagination.page(),
            limit: pagination.limit(),
        }
    }
}
