use serde::{Deserialize, Serialize};

use crate::db::Window;

/// Requested page. `page_size == 0` means "no limit".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub const MAX_PAGE_SIZE: u64 = 100;

    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> Self {
        let page_size = limit.unwrap_or(default_limit).min(Self::MAX_PAGE_SIZE);
        let page = if page_size == 0 {
            1
        } else {
            page.unwrap_or(1).max(1)
        };
        Self { page, page_size }
    }

    pub fn window(&self) -> Window {
        if self.page_size == 0 {
            return Window::all();
        }
        Window {
            skip: (self.page - 1).saturating_mul(self.page_size),
            limit: Some(self.page_size),
        }
    }

    pub fn page_count(&self, total: u64) -> u64 {
        if self.page_size == 0 {
            1
        } else {
            total.div_ceil(self.page_size)
        }
    }

    pub fn describe(&self, total: u64) -> Pagination {
        Pagination {
            total,
            page: self.page,
            page_size: self.page_size,
            page_count: self.page_count(total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub page_count: u64,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
