use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::CacheError;

/// A directory of byte blobs keyed by opaque strings.
///
/// Each key maps to a file named by the hex SHA-256 of the key. There is no
/// expiry; callers invalidate by choosing a new key or calling
/// [`clear`](Self::clear).
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Opens a cache rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| CacheError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Read { path, source: e }),
        }
    }

    pub fn set(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(key);
        fs::write(&path, bytes).map_err(|e| CacheError::Write { path, source: e })
    }

    pub fn has(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Write { path, source: e }),
        }
    }

    /// Removes every file in the cache directory.
    pub fn clear(&self) -> Result<(), CacheError> {
        let read_err = |e: std::io::Error| CacheError::Read {
            path: self.dir.clone(),
            source: e,
        };
        for entry in fs::read_dir(&self.dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| CacheError::Write { path, source: e })?;
            }
        }
        Ok(())
    }

    /// Reads and decodes a JSON payload.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(bytes) = self.get(key)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CacheError::Malformed {
                path: self.path_for(key),
                source: e,
            })
    }

    /// Encodes `value` as JSON and stores it under `key`.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(CacheError::Encode)?;
        self.set(key, &bytes)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(hash_key(key))
    }
}

/// Hex SHA-256 of `key`.
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
