/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Default page size for list queries.
pub const DEFAULT_PER_PAGE: i64 = 25;

/// Maximum page size for list queries.
pub const MAX_PER_PAGE: i64 = 100;

/// 1-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: i64,
    per_page: i64,
}

impl Page {
    /// Build a page, clamping both values into their valid ranges.
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Row limit for SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Row offset for SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_out_of_range_values() {
        let page = Page::new(0, 1_000);
        assert_eq!(page.page(), 1);
        assert_eq!(page.per_page(), MAX_PER_PAGE);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(Page::new(1, 25).offset(), 0);
        assert_eq!(Page::new(3, 10).offset(), 20);
    }

    #[test]
    fn offset_saturates_for_huge_page_numbers() {
        assert_eq!(Page::new(i64::MAX, MAX_PER_PAGE).offset(), i64::MAX);
    }
}
