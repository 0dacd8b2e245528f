use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{Result, StorageError};

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, Deserialize, IntoParams, ToSchema)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PageParams {
    pub fn validate(&self) -> Result<()> {
        if self.page < 1 {
            return Err(StorageError::Validation("page must be >= 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(StorageError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, params: PageParams, total_items: i64) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + params.page_size - 1) / params.page_size
        };
        Self {
            data,
            pagination: PageMeta {
                page: params.page,
                page_size: params.page_size,
                total_items,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        let params = PageParams {
            page: 3,
            page_size: 20,
        };
        assert_eq!(params.offset(), 40);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn test_bounds() {
        assert!(PageParams::default().validate().is_ok());
        assert!(PageParams { page: 0, page_size: 20 }.validate().is_err());
        assert!(PageParams { page: 1, page_size: 101 }.validate().is_err());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Page<()> = Page::new(vec![], PageParams { page: 1, page_size: 20 }, 41);
        assert_eq!(page.pagination.total_pages, 3);

        let empty: Page<()> = Page::new(vec![], PageParams::default(), 0);
        assert_eq!(empty.pagination.total_pages, 0);
    }
}
