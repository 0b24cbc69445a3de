use serde::Serialize;

use crate::error::{Error, Result};

pub const PAGE_SIZE: usize = 10;

pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// Half-open index range of a 1-based page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: usize,
    pub end: usize,
}

impl PageWindow {
    pub fn new(page: usize, page_size: usize, len: usize) -> Self {
        let start = page
            .checked_sub(1)
            .and_then(|p| p.checked_mul(page_size))
            .map_or(len, |s| s.min(len));
        let end = start.saturating_add(page_size).min(len);
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Pages are 1-based; 0 is a caller error rather than an empty page.
pub fn check_page(page: usize) -> Result<usize> {
    if page == 0 {
        return Err(Error::Validation("page must be 1 or greater".to_string()));
    }
    Ok(page)
}

pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let window = PageWindow::new(page, page_size, items.len());
    &items[window.start..window.end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "page")]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// Pager layout: every page up to three pages, otherwise first, current and
/// last with ellipses standing in for the gaps.
pub fn page_links(page: usize, total: usize) -> Vec<PageLink> {
    if total <= 3 {
        return (1..=total).map(PageLink::Page).collect();
    }

    let mut links = vec![PageLink::Page(1)];
    if page > 2 {
        links.push(PageLink::Ellipsis);
    }
    if page > 1 && page < total {
        links.push(PageLink::Page(page));
    }
    if page + 2 < total {
        links.push(PageLink::Ellipsis);
    }
    links.push(PageLink::Page(total));
    links
}

pub fn render_links(links: &[PageLink], current: usize) -> String {
    links
        .iter()
        .map(|link| match link {
            PageLink::Page(n) if *n == current => format!("[{n}]"),
            PageLink::Page(n) => n.to_string(),
            PageLink::Ellipsis => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
