use serde::{Deserialize, Serialize};

/// One page of a cursor-paginated backend listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, next_page: Option<String>) -> Self {
        Self { results, next_page }
    }

    pub fn is_last(&self) -> bool {
        self.next_page.as_deref().map_or(true, str::is_empty)
    }
}
