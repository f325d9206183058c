use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::warn;

use super::LocalStore;
use crate::error::{AppError, AppResult};

/// JSON-file backed store. The whole map is rewritten on every mutation through a
/// temp file + rename, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    map: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`. An unreadable file starts empty.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() { std::fs::create_dir_all(dir)?; }
        }
        let map = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, String>>(&bytes) {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %path.display(), "local storage file unreadable, starting empty: {}", e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(AppError::Storage(format!("{}: {}", path.display(), e))),
        };
        Ok(Self { path, map: RwLock::new(map) })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn tmp_path(&self) -> PathBuf { self.path.with_extension("json.tmp") }

    fn persist(&self, map: &BTreeMap<String, String>) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()> {
        // Hold the write lock across the disk write so concurrent writers serialize.
        let mut w = self.map.write();
        let mut next = w.clone();
        for (k, v) in entries {
            next.insert((*k).to_string(), (*v).to_string());
        }
        self.persist(&next)?;
        *w = next;
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> AppResult<()> {
        let mut w = self.map.write();
        if !keys.iter().any(|k| w.contains_key(*k)) { return Ok(()); }
        let mut next = w.clone();
        for k in keys { next.remove(*k); }
        self.persist(&next)?;
        *w = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ls.json");
        {
            let s = FileStore::open(&path).unwrap();
            s.set_many(&[("auth_token", "t1"), ("user_data", "{}")]).unwrap();
        }
        let s = FileStore::open(&path).unwrap();
        assert_eq!(s.get("auth_token").unwrap().as_deref(), Some("t1"));
        s.remove_many(&["auth_token", "user_data"]).unwrap();
        let s2 = FileStore::open(&path).unwrap();
        assert_eq!(s2.get("user_data").unwrap(), None);
        assert!(!s2.tmp_path().exists());
    }

    #[test]
    fn garbage_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ls.json");
        std::fs::write(&path, b"not json at all").unwrap();
        let s = FileStore::open(&path).unwrap();
        assert_eq!(s.get("auth_token").unwrap(), None);
        s.set("k", "v").unwrap();
        assert_eq!(FileStore::open(&path).unwrap().get("k").unwrap().as_deref(), Some("v"));
    }
}
