//! The generic filter → sort → paginate → wrap pipeline.
//!
//! Concrete repositories describe their searchable surface with a
//! [`SearchPolicy`] and hand a snapshot of their records to [`run_search`].

use crate::ApplicationError;
use chrono::{DateTime, FixedOffset};
use domain::{Entity, SearchParams, SearchResult, SortDirection};
use serde_json::Value;
use std::cmp::Ordering;
use tracing::{debug, instrument, trace};

/// What a concrete searchable repository can be filtered and sorted by.
pub trait SearchPolicy<E: Entity>: Send + Sync {
    /// Allow-list of fields `sort` may name. Anything else leaves order alone.
    fn sortable_fields(&self) -> &[&str];

    /// Fields inspected by the default filter predicate.
    fn filterable_fields(&self) -> &[&str] {
        &[]
    }

    /// Filter predicate. Only called when a filter is present.
    ///
    /// The default keeps records where any [`filterable_fields`] text value
    /// contains `filter`, ignoring case.
    ///
    /// [`filterable_fields`]: SearchPolicy::filterable_fields
    fn matches_filter(&self, item: &E, filter: &str) -> Result<bool, ApplicationError> {
        let fields = self.filterable_fields();
        if fields.is_empty() {
            return Err(ApplicationError::Configuration(
                "search policy declares no filterable fields and no filter predicate".to_string(),
            ));
        }
        let needle = filter.to_lowercase();
        Ok(fields.iter().any(|field| {
            item.field(field)
                .as_ref()
                .and_then(Value::as_str)
                .is_some_and(|text| text.to_lowercase().contains(&needle))
        }))
    }

    /// Sortable fields holding RFC 3339 strings, compared chronologically.
    fn timestamp_fields(&self) -> &[&str] {
        &[]
    }

    /// Ordering applied when the request names no sort field.
    fn default_sort(&self) -> Option<(&str, SortDirection)> {
        None
    }
}

// --- Pipeline stages ---

/// Keeps the records matching `filter`. An absent filter returns `items`
/// untouched without consulting the predicate.
pub fn apply_filter<E, P>(
    policy: &P,
    items: Vec<E>,
    filter: Option<&str>,
) -> Result<Vec<E>, ApplicationError>
where
    E: Entity,
    P: SearchPolicy<E> + ?Sized,
{
    let Some(filter) = filter else {
        return Ok(items);
    };

    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        if policy.matches_filter(&item, filter)? {
            kept.push(item);
        }
    }
    trace!(filter, count = kept.len(), "Records after filtering");
    Ok(kept)
}

/// Stable sort by an allowed field. Without a sort field the policy's default
/// ordering (if any) applies; a field outside the allow-list is a no-op.
pub fn apply_sort<E, P>(
    policy: &P,
    items: Vec<E>,
    sort: Option<&str>,
    sort_dir: Option<SortDirection>,
) -> Vec<E>
where
    E: Entity,
    P: SearchPolicy<E> + ?Sized,
{
    let (field, direction) = match sort {
        Some(field) => (field, sort_dir.unwrap_or(SortDirection::Desc)),
        None => match policy.default_sort() {
            Some(default) => default,
            None => return items,
        },
    };

    if !policy.sortable_fields().iter().any(|allowed| *allowed == field) {
        trace!(field, "Sort field not in allow-list, keeping order");
        return items;
    }
    let timestamps = policy.timestamp_fields().iter().any(|stamp| *stamp == field);
    sort_by_field(items, field, direction, timestamps)
}

/// Slices out page `page` (1-based) of size `per_page`. Pages past the end are
/// empty.
pub fn apply_paginate<E>(items: Vec<E>, page: usize, per_page: usize) -> Vec<E> {
    let start = page.saturating_sub(1).saturating_mul(per_page);
    items.into_iter().skip(start).take(per_page).collect()
}

/// Runs the whole pipeline over a snapshot of records.
#[instrument(skip(policy, items, params), fields(
    page = params.page(),
    per_page = params.per_page(),
    sort = params.sort(),
    filter = params.filter(),
))]
pub fn run_search<E, P>(
    policy: &P,
    items: Vec<E>,
    params: &SearchParams,
) -> Result<SearchResult<E>, ApplicationError>
where
    E: Entity,
    P: SearchPolicy<E> + ?Sized,
{
    let filtered = apply_filter(policy, items, params.filter())?;
    let sorted = apply_sort(policy, filtered, params.sort(), params.sort_dir());
    // Total is counted before pagination.
    let total = sorted.len();
    let page = apply_paginate(sorted, params.page(), params.per_page());
    debug!(total, returned = page.len(), "Search pipeline finished");
    Ok(SearchResult::from_params(page, total, params))
}

// --- Sorting ---

fn sort_by_field<E: Entity>(
    items: Vec<E>,
    field: &str,
    direction: SortDirection,
    timestamps: bool,
) -> Vec<E> {
    // Keys are extracted once; `field` may serialize the whole record.
    let mut keyed: Vec<(SortKey, E)> = items
        .into_iter()
        .map(|item| (SortKey::of(item.field(field).as_ref(), timestamps), item))
        .collect();

    // `sort_by` is stable, and reversing the comparison (not the output) keeps
    // ties in their prior order for descending sorts too.
    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = a.compare(b);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    keyed.into_iter().map(|(_, item)| item).collect()
}

/// Comparable projection of a field value.
///
/// Kinds order as missing/null < bool < number < timestamp < text < composite.
/// Text compares case-insensitively; spellings differing only in case put
/// lower case first (`test < TeSt < TEST`). Strings are read as timestamps
/// only for fields the policy declares as such.
#[derive(Debug)]
enum SortKey {
    Missing,
    Bool(bool),
    Number(f64),
    Timestamp(DateTime<FixedOffset>),
    Text { folded: String, raw: String },
    Composite,
}

impl SortKey {
    fn of(value: Option<&Value>, timestamps: bool) -> Self {
        match value {
            None | Some(Value::Null) => SortKey::Missing,
            Some(Value::Bool(b)) => SortKey::Bool(*b),
            Some(Value::Number(n)) => n.as_f64().map_or(SortKey::Missing, SortKey::Number),
            Some(Value::String(s)) if timestamps => match DateTime::parse_from_rfc3339(s) {
                Ok(ts) => SortKey::Timestamp(ts),
                Err(_) => SortKey::text(s),
            },
            Some(Value::String(s)) => SortKey::text(s),
            Some(Value::Array(_)) | Some(Value::Object(_)) => SortKey::Composite,
        }
    }

    fn text(s: &str) -> Self {
        SortKey::Text {
            folded: s.to_lowercase(),
            raw: s.to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Bool(_) => 1,
            SortKey::Number(_) => 2,
            SortKey::Timestamp(_) => 3,
            SortKey::Text { .. } => 4,
            SortKey::Composite => 5,
        }
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Timestamp(a), SortKey::Timestamp(b)) => a.cmp(b),
            (
                SortKey::Text { folded: a, raw: raw_a },
                SortKey::Text { folded: b, raw: raw_b },
            ) => a
                .cmp(b)
                .then_with(|| {
                    let upper = |raw: &str| raw.chars().map(char::is_uppercase).collect::<Vec<_>>();
                    upper(raw_a.as_str()).cmp(&upper(raw_b.as_str()))
                })
                .then_with(|| raw_a.cmp(raw_b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}
