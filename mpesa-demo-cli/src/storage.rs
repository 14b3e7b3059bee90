//! File-backed session key storage.
//!
//! Values are kept in a single JSON map at `<storage_dir>/keys.json`. On Unix
//! the file is created with `0600` permissions. Values are not encrypted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use mpesa_lib::secure_storage::{
    SecureKeyStorage, SecureStorageError, SecureStorageErrorCode, SecureStorageResult,
    StoreOptions,
};

const KEYS_FILE: &str = "keys.json";

type KeyMap = BTreeMap<String, Vec<u8>>;

/// Session key storage persisted in the CLI storage directory.
pub struct FileKeyStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

fn io_error(context: &str, e: std::io::Error) -> SecureStorageError {
    SecureStorageError::new(
        SecureStorageErrorCode::Io,
        format!("FileKeyStorage: {} failed: {}", context, e),
    )
}

fn lock_error(context: &str) -> SecureStorageError {
    SecureStorageError::new(
        SecureStorageErrorCode::Internal,
        format!("FileKeyStorage: lock poisoned during {}", context),
    )
}

impl FileKeyStorage {
    /// Open (or lazily create) the key file inside `storage_dir`.
    pub fn new(storage_dir: &Path) -> Self {
        Self {
            path: storage_dir.join(KEYS_FILE),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> SecureStorageResult<KeyMap> {
        if !self.path.exists() {
            return Ok(KeyMap::new());
        }
        let contents = std::fs::read(&self.path).map_err(|e| io_error("read", e))?;
        serde_json::from_slice(&contents).map_err(|e| {
            SecureStorageError::new(
                SecureStorageErrorCode::InvalidValue,
                format!("FileKeyStorage: corrupt key file: {}", e),
            )
        })
    }

    fn write_map(&self, map: &KeyMap) -> SecureStorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error("create dir", e))?;
        }
        let contents = serde_json::to_vec_pretty(map).map_err(|e| {
            SecureStorageError::new(SecureStorageErrorCode::Internal, e.to_string())
        })?;
        write_private(&self.path, &contents).map_err(|e| io_error("write", e))
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

impl SecureKeyStorage for FileKeyStorage {
    async fn store(
        &self,
        key_id: &str,
        value: &[u8],
        options: StoreOptions,
    ) -> SecureStorageResult<()> {
        let _guard = self.lock.lock().map_err(|_| lock_error("store"))?;
        let mut map = self.read_map()?;

        if map.contains_key(key_id) && !options.overwrite {
            return Err(SecureStorageError::already_exists(key_id));
        }

        map.insert(key_id.to_string(), value.to_vec());
        self.write_map(&map)
    }

    async fn retrieve(&self, key_id: &str) -> SecureStorageResult<Option<Vec<u8>>> {
        let _guard = self.lock.lock().map_err(|_| lock_error("retrieve"))?;
        Ok(self.read_map()?.remove(key_id))
    }

    async fn delete(&self, key_id: &str) -> SecureStorageResult<()> {
        let _guard = self.lock.lock().map_err(|_| lock_error("delete"))?;
        let mut map = self.read_map()?;

        if map.remove(key_id).is_none() {
            return Err(SecureStorageError::not_found(key_id));
        }
        self.write_map(&map)
    }

    async fn exists(&self, key_id: &str) -> SecureStorageResult<bool> {
        let _guard = self.lock.lock().map_err(|_| lock_error("exists"))?;
        Ok(self.read_map()?.contains_key(key_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpesa_lib::secure_storage::SecureKeyStorageExt;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_storage_persists_across_instances() {
        let dir = tempdir().unwrap();

        let storage = FileKeyStorage::new(dir.path());
        storage.upsert("mpesaSessionKey", b"abc123").await.unwrap();

        let reopened = FileKeyStorage::new(dir.path());
        assert_eq!(
            reopened.retrieve_string("mpesaSessionKey").await.unwrap(),
            Some("abc123".to_string())
        );
        assert!(reopened.exists("mpesaSessionKey").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_storage_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let storage = FileKeyStorage::new(&dir.path().join("nested"));

        assert_eq!(storage.retrieve("anything").await.unwrap(), None);
        assert!(!storage.exists("anything").await.unwrap());
        assert!(storage.delete("anything").await.unwrap_err().is_not_found());
        storage.delete_if_exists("anything").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_storage_no_overwrite() {
        let dir = tempdir().unwrap();
        let storage = FileKeyStorage::new(dir.path());

        storage
            .store("k", b"one", StoreOptions::new())
            .await
            .unwrap();
        let err = storage
            .store("k", b"two", StoreOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, SecureStorageErrorCode::AlreadyExists);

        storage.delete("k").await.unwrap();
        assert!(!storage.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_storage_corrupt_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(KEYS_FILE), "not json").unwrap();

        let storage = FileKeyStorage::new(dir.path());
        let err = storage.retrieve("k").await.unwrap_err();
        assert_eq!(err.code, SecureStorageErrorCode::InvalidValue);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_storage_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let storage = FileKeyStorage::new(dir.path());
        storage.upsert("k", b"v").await.unwrap();

        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
