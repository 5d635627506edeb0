//! Page/page_size query handling for feed listings

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed
    pub page: i64,
    pub page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn positive_param(name: &str, raw: Option<&str>, default: i64) -> Result<i64, String> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(format!("{} must be a positive integer, got '{}'", name, raw)),
    }
}

impl PageRequest {
    /// Parse raw query values; missing values take defaults
    ///
    /// `page_size` above [`MAX_PAGE_SIZE`] is capped. The page number is not
    /// clamped to the number of pages, so a page past the end is empty.
    pub fn parse(page: Option<&str>, page_size: Option<&str>) -> Result<Self, String> {
        let page = positive_param("page", page, 1)?;
        let page_size = positive_param("page_size", page_size, DEFAULT_PAGE_SIZE)?;

        Ok(Self {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }

    /// Offset for SQL LIMIT/OFFSET
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// Paginated response body
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, request: PageRequest) -> Self {
        Self {
            results,
            count,
            page: request.page,
            page_size: request.page_size,
            total_pages: total_pages(count, request.page_size),
        }
    }
}

pub fn total_pages(count: i64, page_size: i64) -> i64 {
    (count + page_size - 1) / page_size
}
