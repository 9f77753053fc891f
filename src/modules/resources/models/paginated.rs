use serde::{Deserialize, Serialize};

use super::query::page_count;

/// One page of a collection, as returned by the record store
///
/// `total` counts every row matching the filter, independent of page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        Self {
            items,
            page,
            total_pages: page_count(total, limit),
            total,
        }
    }

    pub fn empty(page: u32) -> Self {
        Self {
            items: Vec::new(),
            page,
            total_pages: 0,
            total: 0,
        }
    }
}
