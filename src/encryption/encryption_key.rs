use serde::{Deserialize, Serialize};

/// Public key published by a coordinator, valid until `expiry` (epoch
/// millis). All keys from one fetch share the same expiry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptionKey {
    pub key_id: String,
    pub public_key: String,
    pub expiry: u64,
}

impl EncryptionKey {
    /// A key is unusable from its expiry instant onwards.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expiry
    }
}
