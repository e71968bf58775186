//! Client-side session cache.
//!
//! The signed-in user is kept under the single key [`SESSION_KEY`]; its
//! presence is what the route guard and navbar treat as "authenticated".
//! Nothing here talks to the server.

use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::auth::AuthProvider;

pub const SESSION_KEY: &str = "user";

/// The record handed back by login, Google login, complete-registration
/// and profile updates. Missing or null fields decode to their defaults;
/// a stored record counts as signed in whatever it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub auth_provider: AuthProvider,
    #[serde(default, deserialize_with = "null_as_default")]
    pub token: String,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

impl SessionUser {
    /// First and last name, falling back to the email when both are blank.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }

    pub fn is_local(&self) -> bool {
        self.auth_provider == AuthProvider::Local
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key/value persistence under the session cache.
pub trait SessionBackend: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Value>, SessionError>;
    fn save(&self, key: &str, value: Value) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(self.entries().get(key).cloned())
    }

    fn save(&self, key: &str, value: Value) -> Result<(), SessionError> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Stores every key in one JSON object at `{dir}/session.json`, so the
/// signed-in user persists as `{"user": {...}}`.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, SessionError> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            path: dir.as_ref().join("session.json"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => {
                warn!(path = %self.path.display(), "session file unreadable, starting empty");
                Ok(Map::new())
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), SessionError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(self.read_map()?.remove(key))
    }

    fn save(&self, key: &str, value: Value) -> Result<(), SessionError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value);
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut map = self.read_map()?;
        map.remove(key);
        self.write_map(&map)
    }
}

/// Handle to the session cache, cloned into every page controller.
#[derive(Clone)]
pub struct Session {
    backend: Arc<dyn SessionBackend>,
    tx: Arc<watch::Sender<Option<SessionUser>>>,
}

impl Session {
    /// Opens the cache and restores whatever user the backend holds.
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        let restored = restore(backend.as_ref());
        let (tx, _) = watch::channel(restored);
        Self {
            backend,
            tx: Arc::new(tx),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Re-reads the backend, picking up writes made through another handle.
    pub fn reload(&self) -> Option<SessionUser> {
        let user = restore(self.backend.as_ref());
        self.tx.send_if_modified(|current| {
            if *current == user {
                false
            } else {
                *current = user.clone();
                true
            }
        });
        user
    }

    pub fn store(&self, user: SessionUser) -> Result<(), SessionError> {
        self.backend.save(SESSION_KEY, serde_json::to_value(&user)?)?;
        debug!(email = %user.email, "session stored");
        self.tx.send_replace(Some(user));
        Ok(())
    }

    /// Forgets the user. Subscribers see the change even if the backend fails.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.tx.send_replace(None);
        self.backend.remove(SESSION_KEY)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SessionUser>> {
        self.tx.subscribe()
    }
}

fn restore(backend: &dyn SessionBackend) -> Option<SessionUser> {
    let value = match backend.load(SESSION_KEY) {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "session store unreadable, treating as signed out");
            return None;
        }
    };
    match serde_json::from_value::<SessionUser>(value) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(error = %e, "malformed session record removed");
            if let Err(e) = backend.remove(SESSION_KEY) {
                warn!(error = %e, "failed to remove malformed session record");
            }
            None
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user() -> SessionUser {
    SessionUser {
        email: "ada@example.com".into(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        profile_pic: None,
        auth_provider: AuthProvider::Local,
        token: "jwt-token".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn store_and_clear_round_trip_in_memory() {
        let session = Session::in_memory();
        assert!(!session.is_authenticated());

        session.store(sample_user()).unwrap();
        assert_eq!(session.current(), Some(sample_user()));

        session.clear().unwrap();
        assert!(session.current().is_none());
    }

    #[test]
    fn file_backend_persists_envelope_across_reloads() {
        let dir = tempfile::tempdir().unwrap();
        {
            let session = Session::new(Arc::new(FileBackend::new(dir.path()).unwrap()));
            session.store(sample_user()).unwrap();
        }

        let raw = fs::read_to_string(dir.path().join("session.json")).unwrap();
        let on_disk: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk["user"]["firstName"], "Ada");
        assert_eq!(on_disk["user"]["authProvider"], "local");
        assert!(on_disk["user"].get("profilePic").is_none());

        let reopened = Session::new(Arc::new(FileBackend::new(dir.path()).unwrap()));
        assert_eq!(reopened.current(), Some(sample_user()));
    }

    #[test]
    fn partial_record_still_counts_as_signed_in() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .save(SESSION_KEY, json!({ "email": "g@x.io", "profilePic": "p" }))
            .unwrap();

        let session = Session::new(backend.clone());
        let user = session.current().unwrap();
        assert_eq!(user.email, "g@x.io");
        assert_eq!(user.profile_pic.as_deref(), Some("p"));
        assert!(user.token.is_empty());
        assert!(backend.load(SESSION_KEY).unwrap().is_some());
    }

    #[test]
    fn null_names_decode_as_blank() {
        let user: SessionUser = serde_json::from_value(json!({
            "email": "ada@example.com",
            "firstName": null,
            "lastName": null,
            "authProvider": "google",
            "token": "t"
        }))
        .unwrap();
        assert_eq!(user.first_name, "");
        assert_eq!(user.display_name(), "ada@example.com");
        assert_eq!(user.auth_provider, AuthProvider::Google);
    }

    #[test]
    fn non_object_record_is_anonymous_and_removed() {
        let backend = Arc::new(MemoryBackend::new());
        backend.save(SESSION_KEY, json!("ada@example.com")).unwrap();

        let session = Session::new(backend.clone());
        assert!(!session.is_authenticated());
        assert!(backend.load(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn garbage_file_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("session.json"), "{not json").unwrap();
        let session = Session::new(Arc::new(FileBackend::new(dir.path()).unwrap()));
        assert!(session.current().is_none());

        session.store(sample_user()).unwrap();
        let reopened = Session::new(Arc::new(FileBackend::new(dir.path()).unwrap()));
        assert!(reopened.is_authenticated());
    }

    #[test]
    fn reload_sees_writes_from_another_handle() {
        let dir = tempfile::tempdir().unwrap();
        let a = Session::new(Arc::new(FileBackend::new(dir.path()).unwrap()));
        let b = Session::new(Arc::new(FileBackend::new(dir.path()).unwrap()));

        a.store(sample_user()).unwrap();
        assert!(b.current().is_none());
        assert_eq!(b.reload(), Some(sample_user()));
        assert!(b.is_authenticated());
    }

    #[tokio::test]
    async fn subscribers_observe_store_and_clear() {
        let session = Session::in_memory();
        let mut rx = session.subscribe();

        session.store(sample_user()).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().map(|u| u.email.as_str()), Some("ada@example.com"));

        session.clone().clear().unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn last_write_wins() {
        let session = Session::in_memory();
        let mut renamed = sample_user();
        renamed.first_name = "Augusta".into();

        session.store(sample_user()).unwrap();
        session.store(renamed.clone()).unwrap();
        assert_eq!(session.current(), Some(renamed));
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let mut user = sample_user();
        assert_eq!(user.display_name(), "Ada Lovelace");
        user.first_name.clear();
        user.last_name = " ".into();
        assert_eq!(user.display_name(), "ada@example.com");
    }
}
