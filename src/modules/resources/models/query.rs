// Query model for paginated, filterable, sortable resource lists.
//
// `page`/`limit` select a window; `sort`/`order`/`search`/`is_deleted`
// select which rows qualify. The latter four form the filter signature.

use serde::{Deserialize, Serialize};

/// Default first page (pages are 1-indexed)
pub const FIRST_PAGE: u32 = 1;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

/// Which slice of a collection is requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    pub page: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl QueryState {
    pub fn new(limit: u32) -> Self {
        Self {
            page: FIRST_PAGE,
            limit: limit.max(1),
            sort: None,
            order: None,
            search: None,
            is_deleted: None,
        }
    }

    /// Stable serialization of the filter part of the query (page/limit excluded)
    pub fn filter_signature(&self) -> FilterSignature {
        FilterSignature::of(self)
    }

    /// The same filter with the window stripped, for "export everything"
    pub fn export_query(&self) -> ExportQuery {
        ExportQuery {
            sort: self.sort.clone(),
            order: self.order,
            search: self.search.clone(),
            is_deleted: self.is_deleted,
        }
    }

    /// Apply a partial update, returning the merged query
    pub fn merged(&self, patch: &QueryPatch) -> QueryState {
        let mut next = self.clone();
        if let Some(page) = patch.page {
            next.page = page.max(FIRST_PAGE);
        }
        if let Some(limit) = patch.limit {
            next.limit = limit.max(1);
        }
        if let Some(sort) = &patch.sort {
            next.sort = sort.clone();
        }
        if let Some(order) = patch.order {
            next.order = order;
        }
        if let Some(search) = &patch.search {
            next.search = search.clone();
        }
        if let Some(is_deleted) = patch.is_deleted {
            next.is_deleted = is_deleted;
        }
        next
    }

    /// URL parameters for every defined field
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        pairs.extend(self.export_query().to_query_pairs());
        pairs
    }
}

/// `ceil(total / limit)`, 0 when there are no rows
pub fn page_count(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit)) as u32
}

/// Partial update of a [`QueryState`]
///
/// Outer `None` leaves a field as is; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPatch {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<Option<String>>,
    pub order: Option<Option<SortOrder>>,
    pub search: Option<Option<String>>,
    pub is_deleted: Option<Option<bool>>,
}

impl QueryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(Some(field.into()));
        self.order = Some(Some(order));
        self
    }

    pub fn clear_sort(mut self) -> Self {
        self.sort = Some(None);
        self.order = Some(None);
        self
    }

    /// Blank search text clears the search
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        self.search = Some(if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        });
        self
    }

    pub fn is_deleted(mut self, is_deleted: Option<bool>) -> Self {
        self.is_deleted = Some(is_deleted);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == QueryPatch::default()
    }
}

/// Filter-only query used by "export everything"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl ExportQuery {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(is_deleted) = self.is_deleted {
            pairs.push(("isDeleted", is_deleted.to_string()));
        }
        pairs
    }
}

/// Serialized filter part of a query; equal signatures select the same rows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FilterSignature(String);

impl FilterSignature {
    pub fn of(query: &QueryState) -> Self {
        // ExportQuery has a fixed field order, so the JSON is stable
        let signature = serde_json::to_string(&query.export_query()).unwrap_or_default();
        FilterSignature(signature)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FilterSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
