//! Phone-verification codes.
//!
//! `OtpStore` is the seam for the expiring key-value capability: the shipped
//! implementation is process-local, which is fine for a single instance but
//! not under horizontal scaling — a multi-instance deployment plugs an
//! external TTL store in behind the same trait.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;

/// Pending codes live this long before `verify` stops accepting them.
pub const OTP_TTL: Duration = Duration::from_secs(5 * 60);

pub fn generate_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    code.to_string()
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Stores a code for the key, overwriting any pending one.
    async fn put(&self, key: &str, code: &str, ttl: Duration);

    /// Returns the pending code for the key, or `None` when absent or
    /// expired. Does not consume the entry: a mismatched attempt must not
    /// burn the real code.
    async fn get(&self, key: &str) -> Option<String>;

    /// Consumes the entry. Called once verification fully succeeds.
    async fn remove(&self, key: &str);
}

struct OtpEntry {
    code: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryOtpStore {
    entries: DashMap<String, OtpEntry>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn put(&self, key: &str, code: &str, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            OtpEntry {
                code: code.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<String> {
        let (code, expired) = match self.entries.get(key) {
            Some(entry) => (entry.code.clone(), entry.expires_at <= Instant::now()),
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        Some(code)
    }

    async fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn reissue_overwrites_pending_code() {
        let store = InMemoryOtpStore::new();
        store.put("+919999999999", "111111", OTP_TTL).await;
        store.put("+919999999999", "222222", OTP_TTL).await;
        assert_eq!(
            store.get("+919999999999").await.as_deref(),
            Some("222222")
        );
    }

    #[tokio::test]
    async fn lookup_does_not_consume() {
        let store = InMemoryOtpStore::new();
        store.put("+911", "123456", OTP_TTL).await;
        assert!(store.get("+911").await.is_some());
        assert!(store.get("+911").await.is_some());
    }

    #[tokio::test]
    async fn removed_codes_are_single_use() {
        let store = InMemoryOtpStore::new();
        store.put("+911", "123456", OTP_TTL).await;
        store.remove("+911").await;
        assert!(store.get("+911").await.is_none());
    }

    #[tokio::test]
    async fn expired_codes_are_rejected() {
        let store = InMemoryOtpStore::new();
        store.put("+911", "123456", Duration::from_millis(5)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.get("+911").await.is_none());
    }
}
