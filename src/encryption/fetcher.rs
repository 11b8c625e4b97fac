use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::encryption::{
    encryption_key::EncryptionKey,
    traits::{HttpResponse, HttpTransport},
};

const CACHE_CONTROL_HEADER: &str = "cache-control";
const MAX_AGE_DIRECTIVE: &str = "max-age";

/// Why a fetch produced no keys. Only logged: callers see `None`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("key endpoint `{0}` is not https")]
    InsecureUri(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected response status {0}")]
    Status(u16),

    #[error("missing or invalid cache-control max-age")]
    MissingMaxAge,

    #[error("key expiry overflows")]
    ExpiryOverflow,

    #[error("malformed key response: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

/// Body served by a coordinator key endpoint.
#[derive(Debug, Deserialize)]
struct KeysResponse {
    keys: Vec<KeyResponse>,
}

#[derive(Debug, Deserialize)]
struct KeyResponse {
    id: String,
    key: String,
}

/// Fetches public keys from a coordinator's key distribution endpoint.
/// Does not cache anything itself.
#[derive(Debug, Clone, Default)]
pub struct EncryptionKeyFetcher<T: HttpTransport> {
    pub transport: T,
}

impl<T: HttpTransport> EncryptionKeyFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Fetches the keys served at `coordinator_uri`. Every key expires at
    /// `event_time + max-age`. Returns `None` on any failure, never a partial
    /// result.
    pub fn fetch(
        &self,
        coordinator_uri: &str,
        event_time: u64,
    ) -> Option<Vec<EncryptionKey>> {
        match self.try_fetch(coordinator_uri, event_time) {
            Ok(keys) => {
                debug!("Fetched {} keys from {coordinator_uri}", keys.len());
                Some(keys)
            }
            Err(err) => {
                warn!("Failed to fetch keys from {coordinator_uri}: {err}");
                None
            }
        }
    }

    fn try_fetch(
        &self,
        coordinator_uri: &str,
        event_time: u64,
    ) -> Result<Vec<EncryptionKey>, FetchError> {
        if !is_https(coordinator_uri) {
            return Err(FetchError::InsecureUri(coordinator_uri.to_string()));
        }

        let response = self
            .transport
            .get(coordinator_uri)
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        if response.status != 200 {
            return Err(FetchError::Status(response.status));
        }

        let max_age = parse_max_age(&response).ok_or(FetchError::MissingMaxAge)?;
        let expiry = max_age
            .checked_mul(1000)
            .and_then(|ttl| event_time.checked_add(ttl))
            .ok_or(FetchError::ExpiryOverflow)?;

        let body: KeysResponse = serde_json::from_str(&response.body)?;
        let keys = body
            .keys
            .into_iter()
            .map(|key| EncryptionKey {
                key_id: key.id,
                public_key: key.key,
                expiry,
            })
            .collect();
        Ok(keys)
    }
}

fn is_https(uri: &str) -> bool {
    uri.split_once("://")
        .is_some_and(|(scheme, rest)| scheme.eq_ignore_ascii_case("https") && !rest.is_empty())
}

/// Reads `max-age=<seconds>` from the cache-control header(s). Other
/// directives are ignored.
fn parse_max_age(response: &HttpResponse) -> Option<u64> {
    response
        .header_values(CACHE_CONTROL_HEADER)
        .iter()
        .flat_map(|value| value.split(','))
        .find_map(|directive| {
            let (name, seconds) = directive.trim().split_once('=')?;
            if !name.trim().eq_ignore_ascii_case(MAX_AGE_DIRECTIVE) {
                return None;
            }
            seconds.trim().trim_matches('"').parse().ok()
        })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const URI: &str = "https://coordinator.test/v1alpha/publicKeys";
    const BODY: &str = r#"{"keys":[{"id":"0fa73e34-c6f3-4839-a4ed-d1681f185a76","key":"bcy3EsCsm/7rhO1VSl9W+h4MM0dv20xjcFbbLPE16Vg="},{"id":"1","key":"WVZBTFVF"}]}"#;

    struct MockTransport {
        response: Result<HttpResponse, String>,
        calls: Cell<usize>,
    }

    impl MockTransport {
        fn new(response: Result<HttpResponse, String>) -> Self {
            Self {
                response,
                calls: Cell::new(0),
            }
        }
    }

    impl HttpTransport for MockTransport {
        type Error = String;

        fn get(&self, _uri: &str) -> Result<HttpResponse, String> {
            self.calls.set(self.calls.get() + 1);
            self.response.clone()
        }
    }

    fn ok_response() -> HttpResponse {
        HttpResponse::new(200, BODY).with_header("Cache-Control", "max-age=604800")
    }

    #[test]
    fn test_fetch_success() {
        let fetcher = EncryptionKeyFetcher::new(MockTransport::new(Ok(ok_response())));
        let keys = fetcher.fetch(URI, 1653681612892).unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].key_id, "0fa73e34-c6f3-4839-a4ed-d1681f185a76");
        assert_eq!(
            keys[0].public_key,
            "bcy3EsCsm/7rhO1VSl9W+h4MM0dv20xjcFbbLPE16Vg="
        );
        assert!(keys.iter().all(|key| key.expiry == 1654286412892));
    }

    #[test]
    fn test_non_https_uri_is_not_fetched() {
        let fetcher = EncryptionKeyFetcher::new(MockTransport::new(Ok(ok_response())));
        assert!(fetcher.fetch("http://coordinator.test/keys", 0).is_none());
        assert!(fetcher.fetch("coordinator.test/keys", 0).is_none());
        assert_eq!(fetcher.transport.calls.get(), 0);
    }

    #[test]
    fn test_transport_failures() {
        let fetcher = EncryptionKeyFetcher::new(MockTransport::new(Err(
            "connection refused".to_string(),
        )));
        assert!(fetcher.fetch(URI, 0).is_none());

        let fetcher = EncryptionKeyFetcher::new(MockTransport::new(Ok(
            HttpResponse::new(500, BODY).with_header("cache-control", "max-age=10"),
        )));
        assert!(fetcher.fetch(URI, 0).is_none());
    }

    #[test]
    fn test_malformed_body() {
        let response = HttpResponse::new(200, format!("{{{BODY}"))
            .with_header("cache-control", "max-age=10");
        let fetcher = EncryptionKeyFetcher::new(MockTransport::new(Ok(response)));
        assert!(fetcher.fetch(URI, 0).is_none());

        let response = HttpResponse::new(200, r#"{"keys":[{"id":"1"}]}"#)
            .with_header("cache-control", "max-age=10");
        let fetcher = EncryptionKeyFetcher::new(MockTransport::new(Ok(response)));
        assert!(fetcher.fetch(URI, 0).is_none());
    }

    #[test]
    fn test_missing_or_invalid_cache_control() {
        let fetcher = EncryptionKeyFetcher::new(MockTransport::new(Ok(HttpResponse::new(
            200, BODY,
        ))));
        assert!(fetcher.fetch(URI, 0).is_none());

        let response = HttpResponse::new(200, BODY).with_header("cache-control", "no-store");
        let fetcher = EncryptionKeyFetcher::new(MockTransport::new(Ok(response)));
        assert!(fetcher.fetch(URI, 0).is_none());

        let response =
            HttpResponse::new(200, BODY).with_header("cache-control", "max-age=soon");
        let fetcher = EncryptionKeyFetcher::new(MockTransport::new(Ok(response)));
        assert!(fetcher.fetch(URI, 0).is_none());
    }

    #[test]
    fn test_max_age_among_other_directives() {
        let response = HttpResponse::new(200, BODY)
            .with_header("Cache-Control", "public")
            .with_header("Cache-Control", "no-transform, Max-Age=60");
        assert_eq!(parse_max_age(&response), Some(60));

        let fetcher = EncryptionKeyFetcher::new(MockTransport::new(Ok(response)));
        let keys = fetcher.fetch(URI, 1000).unwrap();
        assert!(keys.iter().all(|key| key.expiry == 61000));
    }
}
