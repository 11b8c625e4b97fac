//! Aggregatable attribution: turns a (source, trigger) pair into histogram
//! contributions, mirroring https://github.com/WICG/attribution-reporting-api/blob/main/AGGREGATE.md

pub mod filter_map;
pub mod key;
pub mod payload;
pub mod source;
pub mod trigger;
