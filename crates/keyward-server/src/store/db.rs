use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use super::{KeyStore, LicenseRecord, StoreError};

pub(crate) const LICENSES: TableDefinition<&str, &[u8]> = TableDefinition::new("licenses");

/// Durable key store backed by a single redb file.
///
/// Every operation runs in one redb transaction. Writers are serialized by
/// redb; readers work on MVCC snapshots and never block on writers.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) the database at `path` and make sure the table exists.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)
            .with_context(|| format!("open redb database at {}", path.display()))?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(LICENSES)?;
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn insert_new(&self, record: &LicenseRecord) -> Result<bool> {
        let bytes = encode(record)?;

        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(LICENSES)?;
            if table.get(record.key.as_str())?.is_some() {
                false
            } else {
                table.insert(record.key.as_str(), bytes.as_slice())?;
                true
            }
        };
        if inserted {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(inserted)
    }

    fn lookup(&self, key: &str) -> Result<Option<LicenseRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LICENSES)?;
        let record = match table.get(key)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(record)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(LICENSES)?;
            let existed = table.remove(key)?.is_some();
            existed
        };
        write_txn.commit()?;
        Ok(existed)
    }

    fn count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LICENSES)?;
        Ok(table.len()? as usize)
    }
}

impl KeyStore for RedbStore {
    fn put(&self, record: &LicenseRecord) -> Result<(), StoreError> {
        if self.insert_new(record)? {
            Ok(())
        } else {
            Err(StoreError::DuplicateKey)
        }
    }

    fn get(&self, key: &str) -> Result<LicenseRecord, StoreError> {
        self.lookup(key)?.ok_or(StoreError::NotFound)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.remove(key)? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.count()?)
    }
}

fn encode(record: &LicenseRecord) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(record, bincode::config::standard())
        .context("bincode encode license record")
}

fn decode(bytes: &[u8]) -> Result<LicenseRecord> {
    let (record, _): (LicenseRecord, _) =
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .context("bincode decode license record")?;
    Ok(record)
}
