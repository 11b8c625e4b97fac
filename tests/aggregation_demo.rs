mod common;

use std::collections::{BTreeMap, HashMap};

use aggregatable_attribution::aggregation::{
    filter_map::FilterMap,
    key::AggregationKey,
    payload::{generate, AggregatePayloadGenerator, HistogramContribution, PayloadConfig},
    source::AggregatableSource,
    trigger::{AggregatableTrigger, AggregateDeduplicationKey, TriggerKeyFragment},
};
use common::logging;

#[test]
fn main() -> Result<(), anyhow::Error> {
    logging::init_default_logging();

    // Test similar to https://github.com/WICG/attribution-reporting-api/blob/main/AGGREGATE.md#attribution-trigger-registration
    let mut source_keys = BTreeMap::new();
    source_keys.insert("campaignCounts".to_string(), AggregationKey::from_hex("0x159")?);
    source_keys.insert("geoValue".to_string(), AggregationKey::from_hex("0x5")?);
    let source = AggregatableSource::new(
        source_keys,
        FilterMap::from_iter([("product", vec!["1234", "234"]), ("ctid", vec!["id"])]),
    )?;

    let campaign_fragment = TriggerKeyFragment::new(
        AggregationKey::from_hex("0x400")?,
        ["campaignCounts".to_string()].into(),
        vec![FilterMap::from_iter([("product", vec!["1234"])])],
        vec![FilterMap::from_iter([("product", vec!["100"])])],
    )?;
    let geo_fragment = TriggerKeyFragment::unfiltered(
        AggregationKey::from_hex("0xA80")?,
        ["geoValue", "nonMatch"],
    )?;
    let trigger = AggregatableTrigger::new(
        vec![campaign_fragment, geo_fragment],
        HashMap::from([
            ("campaignCounts".to_string(), 32768),
            ("geoValue".to_string(), 1664),
        ]),
    )
    .with_deduplication_keys(vec![AggregateDeduplicationKey {
        deduplication_key: Some(7),
        filter_set: vec![FilterMap::from_iter([("ctid", vec!["id"])])],
        not_filter_set: vec![],
    }]);

    // Binary OR of the source keypiece and trigger keypiece:
    // 0x159 | 0x400 = 1369 and 0x5 | 0xA80 = 2693.
    let contributions = generate(&source, &trigger).expect("trigger has fragments");
    assert_eq!(
        contributions,
        vec![
            HistogramContribution {
                key: AggregationKey::from_low_bits(1369),
                value: 32768,
            },
            HistogramContribution {
                key: AggregationKey::from_low_bits(2693),
                value: 1664,
            },
        ]
    );

    // Same attribution, padded to a fixed payload size.
    let padded = AggregatePayloadGenerator::new(PayloadConfig {
        max_contributions: 4,
        pad_to_max: true,
    })
    .generate_attribution_report(&source, &trigger)
    .expect("trigger has fragments");
    assert_eq!(padded.len(), 4);
    assert_eq!(&padded[..2], &contributions[..]);

    // The dedup key selected for this source.
    let dedup_key = trigger.maybe_extract_dedup_key(source.filter_map());
    assert_eq!(dedup_key.and_then(|key| key.deduplication_key), Some(7));

    Ok(())
}
