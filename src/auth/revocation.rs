use std::collections::HashSet;
use std::sync::RwLock;

/// Process-local set of revoked token ids. Lookups sit on the hot path of
/// every authenticated request, so this stays a synchronous read lock.
///
/// Revocations do not survive a restart; logged-out tokens become valid
/// again until their natural expiry. A durable store keyed by token id with
/// a TTL would close that gap.
#[derive(Debug, Default)]
pub struct RevocationSet {
    revoked: RwLock<HashSet<String>>,
}

impl RevocationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, jti: &str) {
        if let Ok(mut set) = self.revoked.write() {
            set.insert(jti.to_string());
        }
    }

    /// A poisoned lock reports every token as revoked (fail closed).
    #[must_use]
    pub fn contains(&self, jti: &str) -> bool {
        self.revoked.read().map_or(true, |set| set.contains(jti))
    }
}
