use domain::SearchResult;
use serde::Serialize;

/// Page envelope handed to presenters: mapped items plus the counts they need.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOutput<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub current_page: usize,
    pub last_page: usize,
    pub per_page: usize,
}

impl<T> PaginationOutput<T> {
    /// Takes the already-mapped `items` and the counts from `result`.
    pub fn from_result<E>(items: Vec<T>, result: &SearchResult<E>) -> Self {
        Self {
            items,
            total: result.total(),
            current_page: result.current_page(),
            last_page: result.last_page(),
            per_page: result.per_page(),
        }
    }
}
