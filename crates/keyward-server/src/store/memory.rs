use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use super::{KeyStore, LicenseRecord, StoreError};

const SHARDS: usize = 16;

type Shard = RwLock<HashMap<String, LicenseRecord>>;

/// Volatile key store. Keys are spread over independently locked shards,
/// so operations on different keys rarely touch the same lock.
#[derive(Clone)]
pub struct MemoryStore {
    shards: Arc<[Shard]>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, key: &str) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % self.shards.len()]
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend(anyhow::anyhow!("memory store lock poisoned"))
}

impl KeyStore for MemoryStore {
    fn put(&self, record: &LicenseRecord) -> Result<(), StoreError> {
        let mut shard = self.shard(&record.key).write().map_err(|_| poisoned())?;
        match shard.entry(record.key.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    fn get(&self, key: &str) -> Result<LicenseRecord, StoreError> {
        let shard = self.shard(key).read().map_err(|_| poisoned())?;
        shard.get(key).cloned().ok_or(StoreError::NotFound)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut shard = self.shard(key).write().map_err(|_| poisoned())?;
        shard.remove(key).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.shards.iter().try_fold(0, |acc, shard| {
            Ok(acc + shard.read().map_err(|_| poisoned())?.len())
        })
    }
}
