use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Page size used when the request carries no usable `perPage`.
pub const DEFAULT_PER_PAGE: usize = 15;

// --- Sort direction ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")] // "asc" / "desc" on the wire
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Raw input ---

/// Untrusted page request, as it arrives from a query string or JSON body.
///
/// A missing field (`None`) and an explicit `null` are both accepted; every
/// field is normalized by [`SearchParams::new`].
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchParamsInput {
    #[serde(default)]
    pub page: Option<Value>,
    #[serde(default)]
    pub per_page: Option<Value>,
    #[serde(default)]
    pub sort: Option<Value>,
    #[serde(default)]
    pub sort_dir: Option<Value>,
    #[serde(default)]
    pub filter: Option<Value>,
}

// --- Normalized parameters ---

/// A validated page request. Holds no raw input once constructed.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    page: usize,
    per_page: usize,
    sort: Option<String>,
    sort_dir: Option<SortDirection>,
    filter: Option<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::new(SearchParamsInput::default())
    }
}

impl SearchParams {
    pub fn new(input: SearchParamsInput) -> Self {
        Self::with_default_per_page(input, DEFAULT_PER_PAGE)
    }

    /// Same as [`SearchParams::new`] with a caller-chosen fallback page size.
    /// A zero fallback is replaced by [`DEFAULT_PER_PAGE`].
    pub fn with_default_per_page(input: SearchParamsInput, default_per_page: usize) -> Self {
        let default_per_page = if default_per_page == 0 {
            DEFAULT_PER_PAGE
        } else {
            default_per_page
        };
        let sort = normalize_text(input.sort.as_ref());
        // Direction only means something when there is a field to sort by.
        let sort_dir = sort
            .as_ref()
            .map(|_| normalize_sort_dir(input.sort_dir.as_ref()));

        Self {
            page: normalize_page(input.page.as_ref()),
            per_page: normalize_per_page(input.per_page.as_ref(), default_per_page),
            sort,
            sort_dir,
            filter: normalize_text(input.filter.as_ref()),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn sort_dir(&self) -> Option<SortDirection> {
        self.sort_dir
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Back to the raw shape. Normalizing the result yields `self` again.
    pub fn to_input(&self) -> SearchParamsInput {
        SearchParamsInput {
            page: Some(Value::from(self.page)),
            per_page: Some(Value::from(self.per_page)),
            sort: self.sort.clone().map(Value::String),
            sort_dir: self.sort_dir.map(|dir| Value::from(dir.as_str())),
            filter: self.filter.clone().map(Value::String),
        }
    }
}

// --- Field normalizers ---

/// Positive integer from a loosely typed value.
///
/// Integral numbers and numeric strings (after trimming) are accepted;
/// booleans, arrays, objects, fractions, zero and negatives are not.
fn positive_integer(value: Option<&Value>) -> Option<usize> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() || number < 1.0 || number.fract() != 0.0 {
        return None;
    }
    if number > usize::MAX as f64 {
        return None;
    }
    Some(number as usize)
}

/// `page` falls back to 1 for anything that is not a positive integer.
pub fn normalize_page(value: Option<&Value>) -> usize {
    positive_integer(value).unwrap_or(1)
}

/// `perPage` falls back to `default` for anything that is not a positive integer.
pub fn normalize_per_page(value: Option<&Value>, default: usize) -> usize {
    positive_integer(value).unwrap_or(default)
}

/// Optional text parameter (`sort`, `filter`).
///
/// Null, missing and empty strings are absent. Numbers and booleans keep
/// their textual form; arrays and objects are treated as absent.
pub fn normalize_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_to_text(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn number_to_text(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            // 5.0 reads back as "5", matching how integers print.
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                return (f as i64).to_string();
            }
        }
    }
    n.to_string()
}

/// Only `asc`/`desc` (any case) are honoured; everything else is `desc`.
pub fn normalize_sort_dir(value: Option<&Value>) -> SortDirection {
    match value {
        Some(Value::String(s)) if s.eq_ignore_ascii_case("asc") => SortDirection::Asc,
        _ => SortDirection::Desc,
    }
}

// --- Result envelope ---

/// Everything needed to build a [`SearchResult`]; `last_page` is derived.
#[derive(Debug, Clone)]
pub struct SearchResultProps<E> {
    pub items: Vec<E>,
    pub total: usize,
    pub current_page: usize,
    pub per_page: usize,
    pub sort: Option<String>,
    pub sort_dir: Option<SortDirection>,
    pub filter: Option<String>,
}

/// One page of records plus pagination metadata.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<E> {
    items: Vec<E>,
    total: usize,
    current_page: usize,
    per_page: usize,
    last_page: usize,
    sort: Option<String>,
    sort_dir: Option<SortDirection>,
    filter: Option<String>,
}

impl<E> SearchResult<E> {
    pub fn new(props: SearchResultProps<E>) -> Self {
        let last_page = last_page(props.total, props.per_page);
        Self {
            items: props.items,
            total: props.total,
            current_page: props.current_page,
            per_page: props.per_page,
            last_page,
            sort: props.sort,
            sort_dir: props.sort_dir,
            filter: props.filter,
        }
    }

    /// Wraps a page of items, echoing the request parameters.
    pub fn from_params(items: Vec<E>, total: usize, params: &SearchParams) -> Self {
        Self::new(SearchResultProps {
            items,
            total,
            current_page: params.page(),
            per_page: params.per_page(),
            sort: params.sort.clone(),
            sort_dir: params.sort_dir(),
            filter: params.filter.clone(),
        })
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn into_items(self) -> Vec<E> {
        self.items
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn last_page(&self) -> usize {
        self.last_page
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn sort_dir(&self) -> Option<SortDirection> {
        self.sort_dir
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }
}

/// `ceil(total / per_page)`, never below 1.
pub fn last_page(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 1;
    }
    total.div_ceil(per_page).max(1)
}
