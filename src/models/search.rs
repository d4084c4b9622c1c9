use serde::{Deserialize, Serialize};

use super::SubjectId;
use crate::constants::limits;

/// Server-authoritative paging state for library search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPagination {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Default for SearchPagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            per_page: limits::SEARCH_PAGE_SIZE,
            total: 0,
            total_pages: 0,
            has_next: false,
            has_prev: false,
        }
    }
}

impl SearchPagination {
    /// Page numbers within `radius` of the current page, clamped to the valid range.
    #[must_use]
    pub fn visible_pages(&self, radius: u32) -> Vec<u32> {
        let start = self.current_page.saturating_sub(radius).max(1);
        let end = self.current_page.saturating_add(radius).min(self.total_pages);
        (start..=end).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySearch {
    pub bangumi_ids: Vec<SubjectId>,
    pub pagination: SearchPagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_pages_window() {
        let mut pagination = SearchPagination {
            current_page: 1,
            total_pages: 10,
            ..SearchPagination::default()
        };
        assert_eq!(pagination.visible_pages(2), vec![1, 2, 3]);

        pagination.current_page = 5;
        assert_eq!(pagination.visible_pages(2), vec![3, 4, 5, 6, 7]);

        pagination.current_page = 10;
        assert_eq!(pagination.visible_pages(2), vec![8, 9, 10]);

        pagination.total_pages = 0;
        pagination.current_page = 1;
        assert!(pagination.visible_pages(2).is_empty());
    }
}
