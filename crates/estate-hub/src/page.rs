use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("sort direction must be ASC or DESC, got '{0}'")]
    Direction(String),
    #[error("page size must be between 1 and 100, got {0}")]
    Size(u32),
    #[error("unsupported sort field '{0}'")]
    SortField(String),
}

impl FromStr for SortDirection {
    type Err = PageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(PageError::Direction(value.to_string())),
        }
    }
}

/// Zero-based page coordinates with a validated size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Result<Self, PageError> {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(PageError::Size(size));
        }
        Ok(Self { page, size })
    }

    /// Applies the defaults (page 0, size 10) to missing values.
    pub fn from_parts(page: Option<u32>, size: Option<u32>) -> Result<Self, PageError> {
        Self::new(page.unwrap_or(0), size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the navigation metadata clients render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size());
        let total_pages = total_elements.div_ceil(size);
        let page = u64::from(request.page());
        let has_next = page + 1 < total_pages;
        Self {
            content,
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages,
            first: page == 0,
            last: !has_next,
            has_next,
            has_previous: page > 0,
        }
    }

    pub fn map<U>(mut self, f: impl FnMut(T) -> U) -> Page<U> {
        let content = std::mem::take(&mut self.content).into_iter().map(f).collect();
        self.with_content(content)
    }

    /// Like [`Page::map`], stopping at the first error.
    pub fn try_map<U, E>(mut self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let content = std::mem::take(&mut self.content)
            .into_iter()
            .map(f)
            .collect::<Result<Vec<_>, E>>()?;
        Ok(self.with_content(content))
    }

    fn with_content<U>(&self, content: Vec<U>) -> Page<U> {
        Page {
            content,
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            first: self.first,
            last: self.last,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_of_twenty_five_items() {
        let request = PageRequest::new(2, 10).expect("valid page");
        let page = Page::new(vec![(); 5], request, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.last);
        assert!(!page.has_next);
        assert!(page.has_previous);
        assert!(!page.first);
    }

    #[test]
    fn empty_result_is_single_first_and_last_page() {
        let page: Page<()> = Page::new(Vec::new(), PageRequest::default(), 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.first);
        assert!(page.last);
        assert!(!page.has_next);
    }

    #[test]
    fn rejects_out_of_range_sizes() {
        assert_eq!(PageRequest::new(0, 0), Err(PageError::Size(0)));
        assert_eq!(PageRequest::new(0, 101), Err(PageError::Size(101)));
        assert_eq!(PageRequest::new(3, 100).map(|p| p.offset()), Ok(300));
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("desc".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert!(matches!(
            "sideways".parse::<SortDirection>(),
            Err(PageError::Direction(_))
        ));
    }
}
