use std::{collections::HashSet, fmt::Display};

use log::{debug, info, warn};

use crate::{
    config::CoordinatorConfig,
    encryption::{
        encryption_key::EncryptionKey,
        fetcher::EncryptionKeyFetcher,
        traits::{Clock, EncryptionKeyStorage, HttpTransport},
    },
};

/// Serves coordinator keys from storage, refilling from the coordinator when
/// storage does not hold enough unexpired keys.
///
/// Refills are best effort and not atomic: two callers may both refill the
/// same coordinator and insert the same keys twice. Keys are shared until
/// they expire, so duplicates are harmless. Callers that share a manager
/// across threads wrap it in a lock.
pub struct EncryptionKeyManager<KS, T, C>
where
    KS: EncryptionKeyStorage,
    T: HttpTransport,
    C: Clock,
{
    /// Key storage interface.
    pub key_storage: KS,

    pub fetcher: EncryptionKeyFetcher<T>,

    pub clock: C,

    /// Known coordinators and their key endpoints.
    pub config: CoordinatorConfig,
}

impl<KS, T, C> EncryptionKeyManager<KS, T, C>
where
    KS: EncryptionKeyStorage,
    KS::Error: Display,
    T: HttpTransport,
    C: Clock,
{
    pub fn new(
        key_storage: KS,
        transport: T,
        clock: C,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            key_storage,
            fetcher: EncryptionKeyFetcher::new(transport),
            clock,
            config,
        }
    }

    /// Returns up to `count` keys of the default coordinator.
    pub fn get_keys(&mut self, count: usize) -> Vec<EncryptionKey> {
        let coordinator = self.config.default_origin.clone();
        self.get_keys_for(&coordinator, count)
    }

    /// Returns up to `count` unexpired keys of `coordinator`, fetching more
    /// when storage holds fewer than `count`. Which keys are returned when
    /// more are available is unspecified. An empty result means no key can
    /// be provisioned right now.
    pub fn get_keys_for(
        &mut self,
        coordinator: &str,
        count: usize,
    ) -> Vec<EncryptionKey> {
        if !self.config.is_allowed(coordinator) {
            warn!("Unknown coordinator {coordinator}, no keys provisioned");
            return vec![];
        }

        let now = self.clock.now_millis();

        if self.config.is_local(coordinator) {
            let mut keys = self.fetch_unexpired(coordinator, now).unwrap_or_default();
            keys.truncate(count);
            return keys;
        }

        let mut keys = match self.key_storage.query_unexpired(coordinator, now) {
            Ok(keys) => keys,
            Err(err) => {
                warn!("Failed to query keys of {coordinator}: {err}");
                vec![]
            }
        };

        if keys.len() < count {
            debug!(
                "{} keys stored for {coordinator}, {count} requested, refilling",
                keys.len()
            );
            match self.fetch_unexpired(coordinator, now) {
                Some(fetched) => {
                    self.refill(coordinator, &fetched, now);
                    let known: HashSet<String> =
                        keys.iter().map(|key| key.key_id.clone()).collect();
                    keys.extend(
                        fetched
                            .into_iter()
                            .filter(|key| !known.contains(&key.key_id)),
                    );
                }
                None => {
                    info!(
                        "Refill of {coordinator} failed, serving {} stored keys",
                        keys.len()
                    );
                }
            }
        }

        keys.truncate(count);
        keys
    }

    /// Deletes expired keys of every known coordinator. Returns how many keys
    /// were removed.
    pub fn delete_expired_keys(&mut self) -> usize {
        let now = self.clock.now_millis();
        let mut deleted = 0;
        for coordinator in &self.config.origins {
            match self.key_storage.delete_expired(coordinator, now) {
                Ok(count) => deleted += count,
                Err(err) => {
                    warn!("Failed to delete expired keys of {coordinator}: {err}")
                }
            }
        }
        deleted
    }

    fn fetch_unexpired(
        &self,
        coordinator: &str,
        now: u64,
    ) -> Option<Vec<EncryptionKey>> {
        let uri = self.config.key_fetch_uri(coordinator);
        let mut keys = self.fetcher.fetch(&uri, now)?;
        keys.retain(|key| !key.is_expired(now));
        Some(keys)
    }

    /// Persists fetched keys, then drops expired ones. Failures are logged
    /// and do not affect the keys served to the caller.
    fn refill(&mut self, coordinator: &str, fetched: &[EncryptionKey], now: u64) {
        if !fetched.is_empty() {
            if let Err(err) = self.key_storage.insert(coordinator, fetched.to_vec()) {
                warn!("Failed to store keys of {coordinator}: {err}");
            }
        }
        if let Err(err) = self.key_storage.delete_expired(coordinator, now) {
            warn!("Failed to delete expired keys of {coordinator}: {err}");
        }
    }
}
