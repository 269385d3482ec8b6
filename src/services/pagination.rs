//! Cursor walking over paginated backend listings.

use crate::models::Page;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    Start,
    Next(String),
}

impl Cursor {
    pub fn from_query(cursor: Option<String>) -> Self {
        match cursor {
            Some(c) if !c.is_empty() => Self::Next(c),
            _ => Self::Start,
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Start => None,
            Self::Next(c) => Some(c),
        }
    }
}

/// Progress of a "load more" sequence.
///
/// A failed fetch sets `error` and leaves the cursor untouched, so the next
/// `load_more` asks for the same page again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    next: Option<Cursor>,
    pub error: bool,
    pub pages_loaded: usize,
    pub items_loaded: usize,
}

impl Default for CursorState {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorState {
    pub fn new() -> Self {
        Self::resume(Cursor::Start)
    }

    pub fn resume(cursor: Cursor) -> Self {
        Self {
            next: Some(cursor),
            error: false,
            pages_loaded: 0,
            items_loaded: 0,
        }
    }

    /// Cursor for the next fetch, or `None` once the listing is exhausted.
    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.next.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    pub fn apply<T>(&mut self, page: &Page<T>) {
        self.error = false;
        self.pages_loaded += 1;
        self.items_loaded += page.results.len();
        self.next = if page.is_last() {
            None
        } else {
            page.next_page.clone().map(Cursor::Next)
        };
    }

    pub fn fail(&mut self) {
        self.error = true;
    }
}

/// Fetches one more page and records it in `state`.
///
/// Returns `Ok(None)` without calling `fetch` when the listing is exhausted.
pub async fn load_more<T, E, F, Fut>(state: &mut CursorState, fetch: F) -> Result<Option<Vec<T>>, E>
where
    F: FnOnce(Cursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let Some(cursor) = state.next_cursor().cloned() else {
        return Ok(None);
    };
    match fetch(cursor).await {
        Ok(page) => {
            state.apply(&page);
            Ok(Some(page.results))
        }
        Err(e) => {
            state.fail();
            Err(e)
        }
    }
}

/// Collects every page of a listing, stopping when the server omits a next
/// cursor or after `max_pages` pages.
pub async fn walk<T, E, F, Fut>(mut fetch: F, max_pages: usize) -> Result<Vec<T>, E>
where
    F: FnMut(Cursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut state = CursorState::new();
    let mut items = Vec::new();

    while state.pages_loaded < max_pages {
        match load_more(&mut state, &mut fetch).await? {
            Some(mut batch) => items.append(&mut batch),
            None => break,
        }
    }

    if state.has_more() {
        tracing::warn!(
            "Stopped walking listing after {} pages with more remaining",
            state.pages_loaded
        );
    }

    Ok(items)
}
