use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    aggregation::{
        filter_map::{matches_any, matches_any_not_filter, FilterMap},
        key::AggregationKey,
    },
    errors::AttributionError,
};

/// Trigger-side key piece, applied to the named source keys when its filters
/// accept the source.
/// See https://github.com/WICG/attribution-reporting-api/blob/main/AGGREGATE.md#attribution-trigger-registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerKeyFragment {
    key_piece: AggregationKey,
    source_keys: BTreeSet<String>,
    #[serde(default)]
    filter_set: Vec<FilterMap>,
    #[serde(default)]
    not_filter_set: Vec<FilterMap>,
}

impl TriggerKeyFragment {
    pub fn new(
        key_piece: AggregationKey,
        source_keys: BTreeSet<String>,
        filter_set: Vec<FilterMap>,
        not_filter_set: Vec<FilterMap>,
    ) -> Result<Self, AttributionError> {
        if source_keys.is_empty() {
            return Err(AttributionError::EmptyFragmentSourceKeys);
        }
        Ok(Self {
            key_piece,
            source_keys,
            filter_set,
            not_filter_set,
        })
    }

    /// Fragment without filters, applied to every source it names.
    pub fn unfiltered<I, S>(
        key_piece: AggregationKey,
        source_keys: I,
    ) -> Result<Self, AttributionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            key_piece,
            source_keys.into_iter().map(Into::into).collect(),
            vec![],
            vec![],
        )
    }

    pub fn key_piece(&self) -> &AggregationKey {
        &self.key_piece
    }

    pub fn source_keys(&self) -> &BTreeSet<String> {
        &self.source_keys
    }

    /// Both gates: a positive filter must match, and no non-empty negative
    /// filter may match.
    pub fn applies_to(&self, source_filters: &FilterMap) -> bool {
        matches_any(source_filters, &self.filter_set)
            && !matches_any_not_filter(source_filters, &self.not_filter_set)
    }
}

/// Deduplication key declared by a trigger, selected by its own filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateDeduplicationKey {
    pub deduplication_key: Option<u64>,
    #[serde(default)]
    pub filter_set: Vec<FilterMap>,
    #[serde(default)]
    pub not_filter_set: Vec<FilterMap>,
}

impl AggregateDeduplicationKey {
    fn applies_to(&self, source_filters: &FilterMap) -> bool {
        matches_any(source_filters, &self.filter_set)
            && !matches_any_not_filter(source_filters, &self.not_filter_set)
    }
}

/// Aggregatable part of a trigger (conversion): ordered key fragments, the
/// value contributed per source key name, and deduplication keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatableTrigger {
    pub trigger_data: Vec<TriggerKeyFragment>,
    pub values: HashMap<String, u32>,
    #[serde(default)]
    pub aggregatable_deduplication_keys: Vec<AggregateDeduplicationKey>,
}

impl AggregatableTrigger {
    pub fn new(
        trigger_data: Vec<TriggerKeyFragment>,
        values: HashMap<String, u32>,
    ) -> Self {
        Self {
            trigger_data,
            values,
            aggregatable_deduplication_keys: vec![],
        }
    }

    pub fn with_deduplication_keys(
        mut self,
        keys: Vec<AggregateDeduplicationKey>,
    ) -> Self {
        self.aggregatable_deduplication_keys = keys;
        self
    }

    /// Returns the first deduplication key whose filters accept the source.
    /// If that entry carries no key value, there is no dedup key at all: later
    /// entries are not considered.
    pub fn maybe_extract_dedup_key(
        &self,
        source_filters: &FilterMap,
    ) -> Option<&AggregateDeduplicationKey> {
        self.aggregatable_deduplication_keys
            .iter()
            .find(|dedup_key| dedup_key.applies_to(source_filters))
            .filter(|dedup_key| dedup_key.deduplication_key.is_some())
    }
}
