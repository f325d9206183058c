//! Durable local key/value storage: the client-side equivalent of browser local storage.
//! String keys, string values. Multi-key writes land together or not at all.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::AppResult;

mod file_store;

pub use file_store::FileStore;

pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Write every entry in one step.
    fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()>;

    /// Remove every key in one step. Missing keys are not an error.
    fn remove_many(&self, keys: &[&str]) -> AppResult<()>;

    fn set(&self, key: &str, value: &str) -> AppResult<()> { self.set_many(&[(key, value)]) }

    fn remove(&self, key: &str) -> AppResult<()> { self.remove_many(&[key]) }

    fn contains(&self, key: &str) -> AppResult<bool> { Ok(self.get(key)?.is_some()) }
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.map.read().len() }

    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()> {
        let mut w = self.map.write();
        for (k, v) in entries {
            w.insert((*k).to_string(), (*v).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> AppResult<()> {
        let mut w = self.map.write();
        for k in keys { w.remove(*k); }
        Ok(())
    }
}
