use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::books::repo_types::Book;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Author,
    /// Unknown keys keep scan order.
    Unsorted,
}

/// Raw query string. Numbers stay strings so junk falls back to defaults
/// instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub sort: SortKey,
    pub page: usize,
    pub limit: usize,
}

impl From<CatalogParams> for CatalogQuery {
    fn from(p: CatalogParams) -> Self {
        let sort = match p.sort.as_deref().map(str::trim) {
            None | Some("") | Some("name") => SortKey::Name,
            Some("author") => SortKey::Author,
            Some(_) => SortKey::Unsorted,
        };
        let page = p
            .page
            .as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n >= 1)
            .unwrap_or(1);
        let limit = p
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        Self {
            search: p
                .search
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            sort,
            page,
            limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_books: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Serialize)]
pub struct CatalogPage {
    pub books: Vec<Book>,
    pub pagination: Pagination,
}

/// Filter, sort and slice one page out of `books`.
pub fn run(mut books: Vec<Book>, q: &CatalogQuery) -> CatalogPage {
    if let Some(needle) = &q.search {
        books.retain(|b| {
            b.name.to_lowercase().contains(needle) || b.author.to_lowercase().contains(needle)
        });
    }

    match q.sort {
        SortKey::Name => books.sort_by(|a, b| collate(&a.name, &b.name)),
        SortKey::Author => books.sort_by(|a, b| collate(&a.author, &b.author)),
        SortKey::Unsorted => {} // owner id order from the store
    }

    let total_books = books.len();
    let total_pages = total_books.div_ceil(q.limit);
    let start = (q.page - 1).saturating_mul(q.limit);
    let page: Vec<Book> = books.into_iter().skip(start).take(q.limit).collect();

    CatalogPage {
        books: page,
        pagination: Pagination {
            current_page: q.page,
            total_pages,
            total_books,
            has_next: q.page < total_pages,
            has_prev: q.page > 1,
        },
    }
}

/// Case-folded comparison; the raw strings break ties so the order is total.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
