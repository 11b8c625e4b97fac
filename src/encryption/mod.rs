//! Provisioning of coordinator public keys used to seal aggregatable
//! payloads.

pub mod encryption_key;
pub mod fetcher;
pub mod hashmap_key_storage;
pub mod manager;
pub mod traits;
