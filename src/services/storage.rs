use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur when persisting storage areas
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value namespaces, mirroring the browser's storage areas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    /// Synced preferences: `enabled`, `apiUrl`, `measurements`, `userId`
    Sync,
    /// Local state: savings ledger and widget keys
    Local,
}

impl StorageArea {
    fn file_name(&self) -> &'static str {
        match self {
            StorageArea::Sync => "sync.json",
            StorageArea::Local => "local.json",
        }
    }
}

/// JSON-file backed key-value storage
///
/// Each area is held in memory behind its own lock and written through to
/// `<dir>/<area>.json` on every mutation. Writes to one area are serialized
/// by that area's lock; readers never observe a half-applied update.
pub struct Storage {
    dir: Option<PathBuf>,
    sync: RwLock<Map<String, Value>>,
    local: RwLock<Map<String, Value>>,
}

impl Storage {
    /// Open (or create) storage under `dir`
    ///
    /// Missing files start empty. Unparsable files are logged and treated as
    /// empty rather than failing startup.
    pub async fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        let sync = load_area(&dir.join(StorageArea::Sync.file_name())).await?;
        let local = load_area(&dir.join(StorageArea::Local.file_name())).await?;

        tracing::debug!("Opened storage at {} ({} sync keys, {} local keys)", dir.display(), sync.len(), local.len());

        Ok(Self {
            dir: Some(dir),
            sync: RwLock::new(sync),
            local: RwLock::new(local),
        })
    }

    /// Storage with no backing files
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            sync: RwLock::new(Map::new()),
            local: RwLock::new(Map::new()),
        }
    }

    fn area(&self, area: StorageArea) -> &RwLock<Map<String, Value>> {
        match area {
            StorageArea::Sync => &self.sync,
            StorageArea::Local => &self.local,
        }
    }

    pub async fn get(&self, area: StorageArea, key: &str) -> Option<Value> {
        self.area(area).read().await.get(key).cloned()
    }

    /// Fetch several keys at once; absent keys are left out of the result
    pub async fn get_many(&self, area: StorageArea, keys: &[&str]) -> Map<String, Value> {
        let map = self.area(area).read().await;
        keys.iter()
            .filter_map(|k| map.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect()
    }

    pub async fn set(&self, area: StorageArea, key: &str, value: Value) -> Result<(), StorageError> {
        let mut entries = Map::new();
        entries.insert(key.to_string(), value);
        self.set_many(area, entries).await
    }

    pub async fn set_many(&self, area: StorageArea, entries: Map<String, Value>) -> Result<(), StorageError> {
        let mut map = self.area(area).write().await;
        let mut next = map.clone();
        next.extend(entries);
        self.persist(area, &next).await?;
        *map = next;
        Ok(())
    }

    pub async fn remove(&self, area: StorageArea, key: &str) -> Result<(), StorageError> {
        let mut map = self.area(area).write().await;
        if !map.contains_key(key) {
            return Ok(());
        }
        let mut next = map.clone();
        next.remove(key);
        self.persist(area, &next).await?;
        *map = next;
        Ok(())
    }

    /// Remove every key in the area
    pub async fn clear(&self, area: StorageArea) -> Result<(), StorageError> {
        let mut map = self.area(area).write().await;
        let next = Map::new();
        self.persist(area, &next).await?;
        *map = next;
        Ok(())
    }

    /// Read-modify-write a single key under the area's write lock
    pub async fn update<F>(&self, area: StorageArea, key: &str, f: F) -> Result<Value, StorageError>
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let mut map = self.area(area).write().await;
        let value = f(map.get(key));
        if map.get(key) == Some(&value) {
            return Ok(value);
        }
        let mut next = map.clone();
        next.insert(key.to_string(), value.clone());
        self.persist(area, &next).await?;
        *map = next;
        Ok(value)
    }

    /// Write the area to a temp file, then rename over the real one
    async fn persist(&self, area: StorageArea, map: &Map<String, Value>) -> Result<(), StorageError> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };

        let path = dir.join(area.file_name());
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(map)?;

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::trace!("Persisted {:?} storage ({} keys)", area, map.len());
        Ok(())
    }
}

async fn load_area(path: &Path) -> Result<Map<String, Value>, StorageError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => {
            tracing::warn!("Storage file {} is not a JSON object, starting empty", path.display());
            Ok(Map::new())
        }
        Err(e) => {
            tracing::warn!("Storage file {} is unreadable ({}), starting empty", path.display(), e);
            Ok(Map::new())
        }
    }
}
