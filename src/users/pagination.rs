use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Columns a page may be ordered by. The first entry is the fallback.
const SORTABLE_COLUMNS: &[&str] = &["email", "name", "created_at", "updated_at", "last_login"];

/// 1-based paging request; page 0 means "from the start".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationQuery {
    pub page: u32,
    pub size: u32,
    pub order_by: String,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            order_by: String::new(),
        }
    }
}

impl PaginationQuery {
    pub fn offset(&self) -> i64 {
        if self.page == 0 {
            return 0;
        }
        (self.page as i64 - 1).saturating_mul(self.size as i64)
    }

    pub fn limit(&self) -> i64 {
        self.size as i64
    }

    pub fn total_pages(&self, total_count: i64) -> i64 {
        if self.size == 0 {
            return 0;
        }
        let size = self.size as i64;
        (total_count + size - 1) / size
    }

    /// Coarse on purpose: compares against `total_count / size`, not the page count.
    pub fn has_more(&self, total_count: i64) -> bool {
        if self.size == 0 {
            return false;
        }
        (self.page as i64) < total_count / self.size as i64
    }

    /// Resolves `order_by` to a whitelisted column name.
    pub fn order_column(&self) -> Result<&'static str, ApiError> {
        let requested = self.order_by.trim();
        if requested.is_empty() {
            return Ok(SORTABLE_COLUMNS[0]);
        }
        SORTABLE_COLUMNS
            .iter()
            .copied()
            .find(|c| c.eq_ignore_ascii_case(requested))
            .ok_or_else(|| ApiError::Validation(format!("cannot order by {requested:?}")))
    }
}
