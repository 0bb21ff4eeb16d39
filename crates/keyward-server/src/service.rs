//! License lifecycle: issuance, validation and revocation.
//!
//! Services never call each other; each operation is one logical
//! transaction against the [`KeyStore`], executed on the blocking pool
//! under a deadline so a stalled backend surfaces as
//! [`LicenseError::Unavailable`] instead of a hung request.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use rand::RngCore;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::LicenseError;
use crate::store::{KeyStatus, KeyStore, LicenseRecord, StoreError};

/// Bound on key regenerations after a collision.
pub const MAX_KEY_ATTEMPTS: usize = 5;

/// Random bytes per license key. Rendered as twice as many hex digits.
pub const KEY_BYTES: usize = 16;

/// 128 bits from the OS CSPRNG as upper-case hex.
pub fn generate_license_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode_upper(bytes)
}

impl From<StoreError> for LicenseError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey => LicenseError::DuplicateKey,
            StoreError::NotFound => LicenseError::NotFound,
            StoreError::Backend(e) => LicenseError::Unavailable(format!("{e:#}")),
        }
    }
}

#[derive(Clone)]
pub struct LicenseService {
    store: Arc<dyn KeyStore>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
    generate_key: fn() -> String,
}

impl LicenseService {
    pub fn new(store: Arc<dyn KeyStore>, clock: Arc<dyn Clock>, store_timeout: Duration) -> Self {
        Self {
            store,
            clock,
            store_timeout,
            generate_key: generate_license_key,
        }
    }

    /// Replace the key generator. Only useful for forcing collisions in tests.
    pub fn with_key_generator(mut self, generate_key: fn() -> String) -> Self {
        self.generate_key = generate_key;
        self
    }

    /// Issue a new license, optionally expiring `expires_in_days` days from now.
    pub async fn create(&self, expires_in_days: Option<i64>) -> Result<LicenseRecord, LicenseError> {
        let now = self.clock.now();
        let expires_at = match expires_in_days {
            None => None,
            Some(days) if days <= 0 => {
                return Err(LicenseError::InvalidArgument(
                    "expires_in_days must be a positive integer".into(),
                ))
            }
            Some(days) => Some(
                TimeDelta::try_days(days)
                    .and_then(|ttl| now.checked_add_signed(ttl))
                    .ok_or_else(|| {
                        LicenseError::InvalidArgument(format!(
                            "expires_in_days {days} is beyond the representable date range"
                        ))
                    })?,
            ),
        };

        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let record = LicenseRecord {
                key: (self.generate_key)(),
                issued_at: now,
                expires_at,
            };
            let candidate = record.clone();
            match self.run(move |store| store.put(&candidate)).await {
                Ok(()) => return Ok(record),
                Err(StoreError::DuplicateKey) => {
                    warn!(attempt, "license key collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(LicenseError::Exhausted)
    }

    /// Effective status of `key`. Never mutates the store.
    pub async fn check(&self, key: &str) -> Result<KeyStatus, LicenseError> {
        let now = self.clock.now();
        let key = key.to_owned();
        match self.run(move |store| store.get(&key)).await {
            Ok(record) => Ok(record.status_at(now)),
            Err(StoreError::NotFound) => Ok(KeyStatus::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove `key`. Absent keys, including already-revoked ones, are `NotFound`.
    pub async fn revoke(&self, key: &str) -> Result<(), LicenseError> {
        let key = key.to_owned();
        self.run(move |store| store.delete(&key)).await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<usize, LicenseError> {
        Ok(self.run(|store| store.len()).await?)
    }

    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn KeyStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || op(store.as_ref()));
        match tokio::time::timeout(self.store_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(StoreError::Backend(anyhow::anyhow!(
                "store task failed: {join_err}"
            ))),
            Err(_) => {
                debug!(timeout = ?self.store_timeout, "store call exceeded deadline");
                Err(StoreError::Backend(anyhow::anyhow!(
                    "store did not respond within {}",
                    humantime::format_duration(self.store_timeout)
                )))
            }
        }
    }
}
