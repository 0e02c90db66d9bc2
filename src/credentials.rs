//! Credential storage for the request pipeline.
//!
//! The pipeline reads the access token through a [`CredentialStore`] handed to
//! it at construction instead of a process-wide global. Two implementations are
//! provided:
//! - [`MemoryCredentialStore`] for tests and embedding
//! - [`FileCredentialStore`] which persists to `~/.clinic/credentials.json`
//!
//! Both keep the current values in an [`ArcSwap`]: every write swaps in a new
//! immutable map, so concurrent readers always see a whole pair.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Store key for the bearer token attached to requests.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Store key for the token used by the startup refresh.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Name of the credentials file inside the cache directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Key-value store holding the credential pair.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// Snapshot of both tokens.
    fn pair(&self) -> CredentialPair {
        CredentialPair {
            access_token: self.get(ACCESS_TOKEN_KEY),
            refresh_token: self.get(REFRESH_TOKEN_KEY),
        }
    }
}

/// The access/refresh token tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

type Entries = HashMap<String, String>;

fn with_entry(current: &Entries, key: &str, value: Option<&str>) -> Entries {
    let mut next = current.clone();
    match value {
        Some(value) => {
            next.insert(key.to_string(), value.to_string());
        }
        None => {
            next.remove(key);
        }
    }
    next
}

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: ArcSwap<Entries>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given pair.
    pub fn with_pair(access_token: Option<&str>, refresh_token: Option<&str>) -> Self {
        let mut entries = Entries::new();
        if let Some(token) = access_token {
            entries.insert(ACCESS_TOKEN_KEY.to_string(), token.to_string());
        }
        if let Some(token) = refresh_token {
            entries.insert(REFRESH_TOKEN_KEY.to_string(), token.to_string());
        }
        Self {
            entries: ArcSwap::from_pointee(entries),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.load().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .rcu(|current| Arc::new(with_entry(current, key, Some(value))));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .rcu(|current| Arc::new(with_entry(current, key, None)));
        Ok(())
    }
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.entries.load().keys().cloned().collect();
        f.debug_struct("MemoryCredentialStore")
            .field("keys", &keys)
            .finish()
    }
}

/// On-disk representation of the credentials file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl CredentialsFile {
    fn from_entries(entries: &Entries) -> Self {
        Self {
            access_token: entries.get(ACCESS_TOKEN_KEY).cloned(),
            refresh_token: entries.get(REFRESH_TOKEN_KEY).cloned(),
            updated_at: Some(Utc::now()),
        }
    }

    fn into_entries(self) -> Entries {
        let mut entries = Entries::new();
        if let Some(token) = self.access_token {
            entries.insert(ACCESS_TOKEN_KEY.to_string(), token);
        }
        if let Some(token) = self.refresh_token {
            entries.insert(REFRESH_TOKEN_KEY.to_string(), token);
        }
        entries
    }
}

/// File-backed credential store.
///
/// Loaded once at construction; every write rewrites the whole file.
pub struct FileCredentialStore {
    path: PathBuf,
    entries: ArcSwap<Entries>,
    updated_at: ArcSwap<Option<DateTime<Utc>>>,
    // Held across update and file write so the file always matches memory.
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Open the store in `cache_dir`, defaulting to `~/.clinic`.
    pub fn open(cache_dir: Option<&Path>) -> Result<Self> {
        let base_dir = match cache_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_cache_dir()?,
        };

        std::fs::create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create cache directory: {:?}", base_dir))?;

        let path = base_dir.join(CREDENTIALS_FILE);
        let file = Self::load(&path)?;
        let updated_at = file.updated_at;

        Ok(Self {
            path,
            entries: ArcSwap::from_pointee(file.into_entries()),
            updated_at: ArcSwap::from_pointee(updated_at),
            write_lock: Mutex::new(()),
        })
    }

    fn load(path: &Path) -> Result<CredentialsFile> {
        if !path.exists() {
            return Ok(CredentialsFile::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {:?}", path))?;

        match serde_json::from_str::<CredentialsFile>(&content) {
            Ok(file) => Ok(file),
            Err(e) => {
                warn!("Ignoring unreadable credentials file {:?}: {}", path, e);
                Ok(CredentialsFile::default())
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the credentials were last written, if known.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        **self.updated_at.load()
    }

    /// Drop both tokens and delete the file.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock_writes();
        self.entries.store(Arc::new(Entries::new()));
        self.updated_at.store(Arc::new(None));

        if self.path.exists() {
            std::fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove credentials file: {:?}", self.path)
            })?;
        }

        info!("Credentials removed");
        Ok(())
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(&self, key: &str, value: Option<&str>) -> Result<()> {
        let _guard = self.lock_writes();
        let next = Arc::new(with_entry(&self.entries.load(), key, value));
        self.entries.store(next.clone());
        self.persist(&next)
    }

    /// Caller must hold `write_lock`.
    fn persist(&self, entries: &Entries) -> Result<()> {
        let file = CredentialsFile::from_entries(entries);
        let content =
            serde_json::to_string_pretty(&file).context("Failed to serialize credentials")?;

        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write credentials file: {:?}", self.path))?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| {
                    format!("Failed to restrict credentials file: {:?}", self.path)
                })?;
        }

        self.updated_at.store(Arc::new(file.updated_at));
        debug!("Credentials saved to {:?}", self.path);
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.load().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(key, Some(value))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(key, None)
    }
}

impl std::fmt::Debug for FileCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCredentialStore")
            .field("path", &self.path)
            .finish()
    }
}

/// `~/.clinic`
pub fn default_cache_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Could not determine home directory")?
        .join(".clinic"))
}
