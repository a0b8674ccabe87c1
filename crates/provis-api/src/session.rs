// Session state and persistence
//
// `SessionContext` is the single owner of the signed-in state. It is
// shared (via `Arc`) by the HTTP client and anything else that needs the
// token, and writes the persisted subset through an injected
// `SessionPersistence` so storage stays swappable in tests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;
use crate::models::User;

// ── Session ──────────────────────────────────────────────────────────

/// In-memory session state.
///
/// `is_authenticated` is only ever true while `auth_token` is set and the
/// token has been accepted by the backend since it was loaded.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub is_authenticated: bool,
    pub auth_token: Option<SecretString>,
    pub user: Option<User>,
}

/// The subset of a session written to storage.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub auth_token: String,
    #[serde(default)]
    pub user: Option<User>,
}

impl fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedSession")
            .field("auth_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

// ── Persistence ──────────────────────────────────────────────────────

/// Storage for the persisted session.
pub trait SessionPersistence: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>, Error>;
    fn save(&self, session: &PersistedSession) -> Result<(), Error>;
    fn clear(&self) -> Result<(), Error>;
}

/// Persists the session as a JSON file.
///
/// Another process deleting the file is treated as a sign-out by every
/// client sharing it (see [`SessionContext::reconcile`]).
#[derive(Debug, Clone)]
pub struct FileSessionPersistence {
    path: PathBuf,
}

impl FileSessionPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionPersistence {
    fn load(&self) -> Result<Option<PersistedSession>, Error> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Storage(format!("{}: {e}", self.path.display()))),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::Storage(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }
        let body = serde_json::to_vec_pretty(session).map_err(|e| Error::Storage(e.to_string()))?;

        // Write then rename so readers never observe a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| Error::Storage(e.to_string()))?;
        restrict_permissions(&tmp);
        std::fs::rename(&tmp, &self.path).map_err(|e| Error::Storage(e.to_string()))
    }

    fn clear(&self) -> Result<(), Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("{}: {e}", self.path.display()))),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        warn!(path = %path.display(), error = %e, "could not restrict session file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

/// Keeps the persisted session in memory. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionPersistence {
    slot: Arc<Mutex<Option<PersistedSession>>>,
}

impl MemorySessionPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing persisted session.
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(session))),
        }
    }

    /// Current stored value.
    pub fn stored(&self) -> Option<PersistedSession> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionPersistence for MemorySessionPersistence {
    fn load(&self) -> Result<Option<PersistedSession>, Error> {
        Ok(self.stored())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), Error> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// ── Context ──────────────────────────────────────────────────────────

/// Shared, lock-free holder of the current [`Session`].
pub struct SessionContext {
    state: ArcSwap<Session>,
    persistence: Arc<dyn SessionPersistence>,
    /// Set once the current token has been written to storage. Only then
    /// does a missing stored session mean someone else signed out.
    synced: AtomicBool,
}

impl SessionContext {
    /// Start signed out.
    pub fn new(persistence: Arc<dyn SessionPersistence>) -> Self {
        Self {
            state: ArcSwap::from_pointee(Session::default()),
            persistence,
            synced: AtomicBool::new(false),
        }
    }

    /// Restore the persisted session, if any. The restored token is not
    /// trusted until it has been validated.
    pub fn load(persistence: Arc<dyn SessionPersistence>) -> Result<Self, Error> {
        let stored = persistence.load()?;
        let ctx = Self::new(persistence);
        if let Some(stored) = stored {
            debug!("restored persisted session");
            ctx.state.store(Arc::new(Session {
                is_authenticated: false,
                auth_token: Some(SecretString::from(stored.auth_token)),
                user: stored.user,
            }));
            ctx.synced.store(true, Ordering::SeqCst);
        }
        Ok(ctx)
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> Arc<Session> {
        self.state.load_full()
    }

    pub fn token(&self) -> Option<SecretString> {
        self.state.load().auth_token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.load().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        let state = self.state.load();
        state.is_authenticated && state.auth_token.is_some()
    }

    /// Install a backend-issued token and user, and persist them.
    pub fn establish(&self, token: SecretString, user: User) {
        let persisted = PersistedSession {
            auth_token: token.expose_secret().to_owned(),
            user: Some(user.clone()),
        };
        self.state.store(Arc::new(Session {
            is_authenticated: true,
            auth_token: Some(token),
            user: Some(user),
        }));
        match self.persistence.save(&persisted) {
            Ok(()) => self.synced.store(true, Ordering::SeqCst),
            Err(e) => {
                self.synced.store(false, Ordering::SeqCst);
                warn!(error = %e, "failed to persist session");
            }
        }
    }

    /// Mark a restored token as accepted by the backend.
    pub fn mark_validated(&self) {
        self.state.rcu(|current| {
            let mut next = Session::clone(current);
            next.is_authenticated = next.auth_token.is_some();
            next
        });
    }

    /// Reset to the signed-out state and drop the persisted copy.
    pub fn clear(&self) {
        self.state.store(Arc::new(Session::default()));
        self.synced.store(false, Ordering::SeqCst);
        if let Err(e) = self.persistence.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
    }

    /// Sign out locally if the persisted session was removed elsewhere.
    ///
    /// Returns `true` when the local session was dropped.
    pub fn reconcile(&self) -> bool {
        if !self.synced.load(Ordering::SeqCst) || self.state.load().auth_token.is_none() {
            return false;
        }
        match self.persistence.load() {
            Ok(None) => {
                debug!("persisted session removed externally; signing out locally");
                self.state.store(Arc::new(Session::default()));
                self.synced.store(false, Ordering::SeqCst);
                true
            }
            Ok(Some(_)) => false,
            Err(e) => {
                warn!(error = %e, "could not read persisted session");
                false
            }
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load();
        f.debug_struct("SessionContext")
            .field("is_authenticated", &state.is_authenticated)
            .field("has_token", &state.auth_token.is_some())
            .field("user", &state.user)
            .finish_non_exhaustive()
    }
}
