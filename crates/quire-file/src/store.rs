//! JSON key-value file storage.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, instrument, warn};

use quire_core::Result;
use quire_core::error::{Error, StorageError};
use quire_core::traits::Storage;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

type Entries = BTreeMap<String, String>;

/// Durable storage in a single JSON object file.
///
/// Every write is a locked read-modify-write of the whole file, replaced via
/// a temporary file so readers never see a torn write. The file is created
/// with owner-only permissions on Unix since it holds bearer tokens.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at `path`. The file and its parent directory are created on
    /// first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn map_io(&self, err: std::io::Error) -> Error {
        Error::Storage(StorageError::Io {
            path: self.path.display().to_string(),
            message: err.to_string(),
        })
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.map_io(e))?;
        }
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| self.map_io(e))
    }

    /// Read the current entries. A missing file is empty; a corrupt one is
    /// treated as empty and overwritten by the next write.
    fn load(&self) -> Result<Entries> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(self.map_io(e)),
        };

        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt storage file");
                Ok(Entries::new())
            }
        }
    }

    fn save(&self, entries: &Entries) -> Result<()> {
        let content = serde_json::to_string_pretty(entries).map_err(|e| {
            Error::Storage(StorageError::Encode {
                key: self.path.display().to_string(),
                message: e.to_string(),
            })
        })?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &content).map_err(|e| self.map_io(e))?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&temp_path)
                .map_err(|e| self.map_io(e))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(|e| self.map_io(e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| self.map_io(e))
    }

    /// Apply `change` to the stored entries under an exclusive lock.
    fn update(&self, change: impl FnOnce(&mut Entries)) -> Result<()> {
        let lock_file = self.open_lock()?;
        lock_file.lock_exclusive().map_err(|e| self.map_io(e))?;

        let result = self.load().and_then(|mut entries| {
            change(&mut entries);
            self.save(&entries)
        });

        if let Err(e) = lock_file.unlock() {
            warn!(error = %e, "Failed to release storage lock");
        }
        result
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                warn!(key, error = %e, "Failed to read storage file");
                None
            }
        }
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })?;
        debug!("Stored value");
        Ok(())
    }

    #[instrument(skip(self, entries), fields(path = %self.path.display()))]
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.update(|stored| {
            for (key, value) in entries {
                stored.insert(key.to_string(), value.to_string());
            }
        })?;
        debug!(count = entries.len(), "Stored values");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, key: &str) -> Result<()> {
        self.remove_all(&[key])
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}
