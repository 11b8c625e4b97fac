use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::encryption::encryption_key::EncryptionKey;

/// Interface to persist coordinator keys, partitioned by coordinator origin.
/// Implementations are expected to survive process restarts.
pub trait EncryptionKeyStorage {
    type Error;

    /// Returns the keys of `coordinator` that are not expired at `now`.
    fn query_unexpired(
        &self,
        coordinator: &str,
        now: u64,
    ) -> Result<Vec<EncryptionKey>, Self::Error>;

    /// Stores freshly fetched keys for `coordinator`. Idempotent per key id:
    /// a key already stored is replaced, so its latest expiry wins.
    fn insert(
        &mut self,
        coordinator: &str,
        keys: Vec<EncryptionKey>,
    ) -> Result<(), Self::Error>;

    /// Deletes the keys of `coordinator` that are expired at `now` and
    /// returns how many were removed.
    fn delete_expired(
        &mut self,
        coordinator: &str,
        now: u64,
    ) -> Result<usize, Self::Error>;
}

/// Response of a blocking GET. Header names are stored lowercased, and a
/// header may carry several values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, Vec<String>>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl Into<String>,
    ) -> Self {
        self.headers
            .entry(name.as_ref().to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    /// All values of a header, looked up case-insensitively.
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Blocking HTTPS transport used to reach coordinator key endpoints.
pub trait HttpTransport {
    type Error: std::fmt::Display;

    fn get(&self, uri: &str) -> Result<HttpResponse, Self::Error>;
}

/// Source of the current time, in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}
