use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::classifier::TraderClassification;

/// How long a wallet classification is reused before re-fetching.
pub const DEFAULT_TTL_MINUTES: i64 = 15;

/// Per-process classification cache keyed by lowercase wallet.
pub struct ClassificationCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (DateTime<Utc>, TraderClassification)>>,
}

impl ClassificationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, wallet: &str, now: DateTime<Utc>) -> Option<TraderClassification> {
        let mut entries = self.entries.lock().await;
        let key = wallet.to_lowercase();

        match entries.get(&key) {
            Some((stored_at, c)) if now - *stored_at < self.ttl => Some(c.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store a classification and drop every entry that has expired by `now`.
    pub async fn insert(&self, classification: TraderClassification, now: DateTime<Utc>) {
        let key = classification.wallet.to_lowercase();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (stored_at, _)| now - *stored_at < self.ttl);
        entries.insert(key, (now, classification));
    }

    pub async fn reset(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_TTL_MINUTES))
    }
}
