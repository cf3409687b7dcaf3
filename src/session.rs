// src/session.rs

//! Who is logged in.
//!
//! The session is an explicit context object: restored once at startup from
//! durable storage, replaced wholesale on login, cleared wholesale on logout.
//! Readers get an `Arc<Session>` snapshot and never observe a half-written
//! identity.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::AppError;
use crate::models::user::{Identity, Role};
use crate::utils::jwt;

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key of the serialized [`Identity`].
pub const USER_KEY: &str = "user";

/// Durable string key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// JSON object on disk, one entry per key.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Snapshot of the authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Anonymous,
    Authenticated { token: String, identity: Identity },
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { identity, .. } => Some(identity),
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { token, .. } => Some(token),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|i| i.role)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

/// Owner of the current [`Session`] and its persistence.
pub struct SessionContext {
    store: Box<dyn KeyValueStore>,
    current: RwLock<Arc<Session>>,
}

impl SessionContext {
    /// Builds the context from whatever the store holds.
    ///
    /// A token without a readable identity, or with an expired `exp` claim,
    /// is discarded and both keys are cleared.
    pub fn restore(store: Box<dyn KeyValueStore>) -> Result<Self, AppError> {
        let token = store.get(TOKEN_KEY)?;
        let user = store.get(USER_KEY)?;

        let session = match (token, user) {
            (Some(token), Some(user)) => match serde_json::from_str::<Identity>(&user) {
                Ok(identity) if !jwt::is_expired(&token) => {
                    tracing::info!("Restored session for role {}", identity.role);
                    Session::Authenticated { token, identity }
                }
                Ok(_) => {
                    tracing::info!("Stored token has expired, starting anonymous");
                    store.remove(TOKEN_KEY)?;
                    store.remove(USER_KEY)?;
                    Session::Anonymous
                }
                Err(e) => {
                    tracing::warn!("Discarding unreadable stored identity: {}", e);
                    store.remove(TOKEN_KEY)?;
                    store.remove(USER_KEY)?;
                    Session::Anonymous
                }
            },
            (None, None) => Session::Anonymous,
            _ => {
                tracing::warn!("Discarding half-written session");
                store.remove(TOKEN_KEY)?;
                store.remove(USER_KEY)?;
                Session::Anonymous
            }
        };

        Ok(Self {
            store,
            current: RwLock::new(Arc::new(session)),
        })
    }

    /// Anonymous context over an in-memory store.
    pub fn ephemeral() -> Self {
        Self {
            store: Box::new(MemoryStore::new()),
            current: RwLock::new(Arc::new(Session::Anonymous)),
        }
    }

    pub fn current(&self) -> Arc<Session> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn token(&self) -> Option<String> {
        self.current().token().map(str::to_string)
    }

    /// Persists and installs a new authenticated session.
    pub fn establish(&self, token: String, identity: Identity) -> Result<Arc<Session>, AppError> {
        let user = serde_json::to_string(&identity)?;
        self.store.set(TOKEN_KEY, &token)?;
        self.store.set(USER_KEY, &user)?;

        let session = Arc::new(Session::Authenticated { token, identity });
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&session);
        Ok(session)
    }

    /// Removes both keys and drops back to anonymous.
    pub fn clear(&self) -> Result<(), AppError> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(Session::Anonymous);
        Ok(())
    }

    /// Gate for role-restricted views.
    pub fn require_role(&self, role: Role) -> Result<Identity, AppError> {
        match self.current().identity() {
            None => Err(AppError::AuthFailure("Please log in first".to_string())),
            Some(identity) if identity.role != role => Err(AppError::Forbidden(format!(
                "This view is only available to {} accounts",
                role
            ))),
            Some(identity) => Ok(identity.clone()),
        }
    }
}
