use serde::Deserialize;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Query-string pagination and ordering parameters
///
/// `sort_by` is resolved against a per-resource allow-list before it gets
/// anywhere near SQL; an unknown column silently falls back to the default
/// rather than erroring, so clients can share sort keys across resources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PageParams {
    /// 1-based page, clamped to at least 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to 1..=100
    pub fn page_size(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        self.page_size()
    }

    pub fn offset(&self) -> i64 {
        // Saturating: a huge page number must cap out, not overflow into a
        // panic or a negative OFFSET.
        self.page().saturating_sub(1).saturating_mul(self.page_size())
    }

    /// Resolves the sort column against `allowed`, falling back to `default`
    pub fn sort_by<'a>(&'a self, allowed: &[&'a str], default: &'a str) -> &'a str {
        match &self.sort_by {
            Some(requested) => allowed
                .iter()
                .find(|column| **column == requested.as_str())
                .copied()
                .unwrap_or(default),
            None => default,
        }
    }

    /// True when the client asked for descending order
    pub fn descending(&self) -> bool {
        matches!(self.sort_order.as_deref(), Some("desc") | Some("DESC"))
    }
}

/// Sortable columns for the users listing
pub const USER_SORT_COLUMNS: &[&str] = &["id", "name", "email", "created_at"];
