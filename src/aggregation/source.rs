use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    aggregation::{filter_map::FilterMap, key::AggregationKey},
    errors::AttributionError,
};

/// Aggregatable part of an attribution source (impression). Maps each source
/// key name to its key piece, plus the filters describing the source.
///
/// Keys are kept sorted by name so that attribution is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatableSource {
    aggregatable_source: BTreeMap<String, AggregationKey>,
    filter_map: FilterMap,
}

impl AggregatableSource {
    pub fn new(
        aggregatable_source: BTreeMap<String, AggregationKey>,
        filter_map: FilterMap,
    ) -> Result<Self, AttributionError> {
        if aggregatable_source.keys().any(|name| name.is_empty()) {
            return Err(AttributionError::EmptySourceKeyName);
        }
        Ok(Self {
            aggregatable_source,
            filter_map,
        })
    }

    pub fn keys(&self) -> &BTreeMap<String, AggregationKey> {
        &self.aggregatable_source
    }

    pub fn get(&self, name: &str) -> Option<&AggregationKey> {
        self.aggregatable_source.get(name)
    }

    pub fn filter_map(&self) -> &FilterMap {
        &self.filter_map
    }
}
