pub mod db;
pub mod memory;
pub mod model;

pub use db::RedbStore;
pub use memory::MemoryStore;
pub use model::{KeyStatus, LicenseRecord};

/// Failures surfaced by a [`KeyStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("license key already exists")]
    DuplicateKey,
    #[error("license key not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Mapping from license key to [`LicenseRecord`].
///
/// Each operation is atomic with respect to the others on the same key:
/// a reader sees either no record or a complete one.
pub trait KeyStore: Send + Sync + 'static {
    /// Insert a new record. Fails with `DuplicateKey` if the key exists.
    fn put(&self, record: &LicenseRecord) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<LicenseRecord, StoreError>;

    /// Remove a record. Fails with `NotFound` if the key is absent.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Number of stored records.
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
