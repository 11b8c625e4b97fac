use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::aggregation::{
    key::AggregationKey, source::AggregatableSource, trigger::AggregatableTrigger,
};

/// Default cap on the number of contributions in one payload.
pub const DEFAULT_MAX_CONTRIBUTIONS: usize = 20;

/// One histogram bucket and the value attributed to it. Plaintext here, the
/// payload is sealed by the caller with a coordinator key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistogramContribution {
    pub key: AggregationKey,
    pub value: u32,
}

impl HistogramContribution {
    /// Null contribution used for padding. Adds nothing to any bucket.
    pub fn null() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadConfig {
    /// Contributions beyond this count are dropped.
    pub max_contributions: usize,

    /// Pads payloads with null contributions up to `max_contributions`, so
    /// the number of real contributions is not visible from the payload size.
    pub pad_to_max: bool,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            max_contributions: DEFAULT_MAX_CONTRIBUTIONS,
            pad_to_max: false,
        }
    }
}

/// Builds aggregatable report payloads from a source and a trigger.
#[derive(Debug, Clone, Default)]
pub struct AggregatePayloadGenerator {
    pub config: PayloadConfig,
}

impl AggregatePayloadGenerator {
    pub fn new(config: PayloadConfig) -> Self {
        Self { config }
    }

    /// Returns `None` when the trigger declares no key fragment at all.
    /// Otherwise returns the contributions, possibly empty, in fragment order
    /// and, within one fragment, in source key name order.
    ///
    /// Each source key contributes at most once: the first fragment that
    /// accepts the source and names the key wins.
    pub fn generate_attribution_report(
        &self,
        source: &AggregatableSource,
        trigger: &AggregatableTrigger,
    ) -> Option<Vec<HistogramContribution>> {
        if trigger.trigger_data.is_empty() {
            debug!("Trigger has no key fragments, no aggregatable report");
            return None;
        }

        let source_filters = source.filter_map();
        let mut contributed: HashSet<&str> = HashSet::new();
        let mut contributions = vec![];

        'fragments: for fragment in &trigger.trigger_data {
            if !fragment.applies_to(source_filters) {
                continue;
            }

            for name in fragment.source_keys() {
                if contributed.contains(name.as_str()) {
                    continue;
                }
                let Some(source_key) = source.get(name) else {
                    continue;
                };
                let Some(&value) = trigger.values.get(name) else {
                    continue;
                };

                if contributions.len() >= self.config.max_contributions {
                    debug!(
                        "Dropping contributions over the cap of {}",
                        self.config.max_contributions
                    );
                    break 'fragments;
                }

                let key = source_key.combine(fragment.key_piece());
                debug!("Contribution for {name}: key {key}, value {value}");
                contributions.push(HistogramContribution { key, value });
                contributed.insert(name.as_str());
            }
        }

        if self.config.pad_to_max {
            contributions.resize(
                self.config.max_contributions.max(contributions.len()),
                HistogramContribution::null(),
            );
        }

        Some(contributions)
    }
}

/// Generates contributions with the default payload configuration.
pub fn generate(
    source: &AggregatableSource,
    trigger: &AggregatableTrigger,
) -> Option<Vec<HistogramContribution>> {
    AggregatePayloadGenerator::default().generate_attribution_report(source, trigger)
}
