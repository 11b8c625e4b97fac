use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Attribute filters, from filter name to the values declared for it.
/// Used on the source side (attributes of the impression) and on the trigger
/// side (constraints on those attributes).
/// See https://github.com/WICG/attribution-reporting-api/blob/main/EVENT.md#optional-attribution-filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterMap {
    pub attribution_filters: HashMap<String, Vec<String>>,
}

impl FilterMap {
    pub fn new(attribution_filters: HashMap<String, Vec<String>>) -> Self {
        Self {
            attribution_filters,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attribution_filters.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Vec<String>> {
        self.attribution_filters.get(name)
    }
}

impl<K, V, I> FromIterator<(K, I)> for FilterMap
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = V>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let attribution_filters = iter
            .into_iter()
            .map(|(name, values)| {
                (name.into(), values.into_iter().map(Into::into).collect())
            })
            .collect();
        Self {
            attribution_filters,
        }
    }
}

/// Checks whether the source filters satisfy the trigger filters.
///
/// If either side is empty, nothing is asserted and `match_on_empty` is
/// returned. Otherwise every name in `trigger_filters` must be declared by
/// the source with at least one value in common. Names only declared by the
/// source are ignored.
pub fn matches(
    source_filters: &FilterMap,
    trigger_filters: &FilterMap,
    match_on_empty: bool,
) -> bool {
    if source_filters.is_empty() || trigger_filters.is_empty() {
        return match_on_empty;
    }

    trigger_filters
        .attribution_filters
        .iter()
        .all(|(name, trigger_values)| match source_filters.get(name) {
            Some(source_values) => source_values
                .iter()
                .any(|value| trigger_values.contains(value)),
            None => false,
        })
}

/// Positive gate over a list of filter maps: passes when the list is empty or
/// when any map matches the source filters.
pub fn matches_any(source_filters: &FilterMap, filter_set: &[FilterMap]) -> bool {
    filter_set.is_empty()
        || filter_set
            .iter()
            .any(|filters| matches(source_filters, filters, true))
}

/// Negative gate over a list of filter maps: true when some non-empty map
/// matches the source filters, i.e. when the caller must be excluded.
pub fn matches_any_not_filter(
    source_filters: &FilterMap,
    not_filter_set: &[FilterMap],
) -> bool {
    not_filter_set
        .iter()
        .filter(|filters| !filters.is_empty())
        .any(|filters| matches(source_filters, filters, true))
}
