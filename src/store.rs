use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::token::TokenPair;

/// Storage abstraction for the persisted session token pair.
///
/// Implementations hold at most one pair and treat its contents as opaque.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<TokenPair>, AuthError>;
    fn save(&self, pair: &TokenPair) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Configuration for file-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    pub base_dir: PathBuf,
}

impl TokenStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_tenauth_dir()
    }
}

/// File-backed token store using a TOML session file.
///
/// # Example
/// ```no_run
/// use tenauth::{FileTokenStore, TokenPair, TokenStore};
///
/// let store = FileTokenStore::new_default();
/// store.save(&TokenPair::new("access", "refresh"))?;
/// # Ok::<(), tenauth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    base_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self {
            base_dir: config.base_dir,
        }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_tenauth_dir(),
        }
    }

    fn session_path(&self) -> PathBuf {
        self.base_dir.join("session.toml")
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenPair>, AuthError> {
        let path = self.session_path();
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: SessionFile = toml::from_str(&raw)?;
        Ok(Some(file.tokens))
    }

    fn save(&self, pair: &TokenPair) -> Result<(), AuthError> {
        let path = self.session_path();
        Self::ensure_parent(&path)?;
        let file = SessionFile {
            version: 1,
            tokens: pair.clone(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let path = self.session_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// In-memory token store for tests and embedders that manage persistence
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    pair: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<TokenPair>, AuthError> {
        Ok(self
            .pair
            .lock()
            .map_err(|_| AuthError::Io("token store lock poisoned".to_string()))?
            .clone())
    }

    fn save(&self, pair: &TokenPair) -> Result<(), AuthError> {
        *self
            .pair
            .lock()
            .map_err(|_| AuthError::Io("token store lock poisoned".to_string()))? =
            Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self
            .pair
            .lock()
            .map_err(|_| AuthError::Io("token store lock poisoned".to_string()))? = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    tokens: TokenPair,
    saved_at: DateTime<Utc>,
}

fn default_tenauth_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".tenauth"))
        .unwrap_or_else(|| PathBuf::from(".tenauth"))
}
