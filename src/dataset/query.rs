//! Filter and derivation helpers shared by the snapshot queries

use std::collections::HashSet;

/// Distinct values in first-occurrence order.
pub(crate) fn distinct_in_order<'a, I>(values: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(*value))
        .collect()
}

/// Records matching `predicate`, in source order.
pub(crate) fn filter_records<'a, T, F>(records: &'a [T], label: &str, predicate: F) -> Vec<&'a T>
where
    F: Fn(&T) -> bool,
{
    tracing::debug!(filter = label, before = records.len(), "applying filter");
    let matched: Vec<&T> = records.iter().filter(|r| predicate(r)).collect();
    tracing::debug!(filter = label, after = matched.len(), "filter applied");
    matched
}
