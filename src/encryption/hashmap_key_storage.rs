use std::collections::HashMap;

use anyhow::ensure;

use crate::encryption::{encryption_key::EncryptionKey, traits::EncryptionKeyStorage};

/// A simple in-memory key storage. Stores a mapping of coordinator origin to
/// its keys, in insertion order. Clones keys when asked to retrieve them.
#[derive(Debug, Default)]
pub struct HashMapEncryptionKeyStorage {
    keys: HashMap<String, Vec<EncryptionKey>>,
}

impl HashMapEncryptionKeyStorage {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Number of stored keys for `coordinator`, expired ones included.
    pub fn len(&self, coordinator: &str) -> usize {
        self.keys.get(coordinator).map_or(0, Vec::len)
    }
}

impl EncryptionKeyStorage for HashMapEncryptionKeyStorage {
    type Error = anyhow::Error;

    fn query_unexpired(
        &self,
        coordinator: &str,
        now: u64,
    ) -> Result<Vec<EncryptionKey>, Self::Error> {
        let keys = self
            .keys
            .get(coordinator)
            .map(|keys| {
                keys.iter()
                    .filter(|key| !key.is_expired(now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(keys)
    }

    fn insert(
        &mut self,
        coordinator: &str,
        keys: Vec<EncryptionKey>,
    ) -> Result<(), Self::Error> {
        ensure!(!coordinator.is_empty(), "Coordinator origin is empty");
        let stored = self.keys.entry(coordinator.to_string()).or_default();
        // One entry per key id: a refetched key replaces the stored one.
        for key in keys {
            match stored.iter_mut().find(|stored| stored.key_id == key.key_id) {
                Some(existing) => *existing = key,
                None => stored.push(key),
            }
        }
        Ok(())
    }

    fn delete_expired(
        &mut self,
        coordinator: &str,
        now: u64,
    ) -> Result<usize, Self::Error> {
        let Some(keys) = self.keys.get_mut(coordinator) else {
            return Ok(0);
        };
        let before = keys.len();
        keys.retain(|key| !key.is_expired(now));
        Ok(before - keys.len())
    }
}
