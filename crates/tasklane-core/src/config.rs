use crate::tags::STARTER_TAGS;
use std::time::Duration;

/// Store behaviour that callers may tune.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Upper bound on each gateway call. Expiry counts as a remote failure.
    pub remote_timeout: Duration,
    /// Tags persisted for a user whose tag table is empty.
    pub starter_tags: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(10),
            starter_tags: STARTER_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl StoreConfig {
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }
}
