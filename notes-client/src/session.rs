use std::{
    fmt,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use crate::{Error, Result};

/// Bearer credential of an authenticated user. Created at sign in and handed
/// explicitly to whatever talks to the gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// Keeps the session across runs.
pub trait CredentialStore {
    fn load(&self) -> Result<Option<Session>>;
    fn save(&self, session: &Session) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Token kept in a single file, readable only by the owner on unix.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Session>> {
        match fs::read_to_string(&self.path) {
            Ok(token) => {
                let token = token.trim();
                Ok((!token.is_empty()).then(|| Session::new(token)))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        fs::write(&self.path, session.token())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    session: Arc<Mutex<Option<Session>>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

impl MemoryCredentialStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Session>>> {
        self.session
            .lock()
            .map_err(|_| Error::Unexpected("credential store poisoned".into()))
    }
}

/// Gates access to the notes: no session means the user has to authenticate
/// first, and an auth failure anywhere ends the session.
#[derive(Debug)]
pub struct SessionController<S> {
    store: S,
    session: Option<Session>,
}

impl<S: CredentialStore> SessionController<S> {
    pub fn new(store: S) -> Self {
        Self { store, session: None }
    }

    /// The current session, restoring a persisted one if needed.
    /// `Error::Unauthorized` means the user must sign in.
    pub fn resume(&mut self) -> Result<Session> {
        if self.session.is_none() {
            self.session = self.store.load()?;
            if self.session.is_some() {
                tracing::info!("restored persisted session");
            }
        }
        self.session.clone().ok_or(Error::Unauthorized)
    }

    pub fn sign_in(&mut self, session: Session) -> Result<Session> {
        self.store.save(&session)?;
        self.session = Some(session.clone());
        tracing::info!("signed in");
        Ok(session)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session = None;
        self.store.clear()?;
        tracing::info!("signed out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Ends the session on an auth failure. Returns whether the caller has to
    /// send the user back to authentication.
    pub fn handle_error(&mut self, error: &Error) -> Result<bool> {
        if !error.is_unauthorized() {
            return Ok(false);
        }
        tracing::warn!("credential rejected by gateway");
        self.logout()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_token() {
        let session = Session::new("secret-token");
        assert!(!format!("{session:?}").contains("secret-token"));
    }

    #[test]
    fn resume_without_credential_requires_auth() {
        let mut controller = SessionController::new(MemoryCredentialStore::default());
        assert!(controller.resume().unwrap_err().is_unauthorized());
        assert!(!controller.is_authenticated());
    }

    #[test]
    fn sign_in_persists_session() {
        let store = MemoryCredentialStore::default();
        let mut controller = SessionController::new(store.clone());
        controller.sign_in(Session::new("abc")).unwrap();

        let mut restored = SessionController::new(store);
        assert_eq!(restored.resume().unwrap().token(), "abc");
    }

    #[test]
    fn auth_error_clears_store() {
        let store = MemoryCredentialStore::default();
        let mut controller = SessionController::new(store.clone());
        controller.sign_in(Session::new("abc")).unwrap();

        assert!(!controller.handle_error(&Error::NotFound("Note not found".into())).unwrap());
        assert!(controller.is_authenticated());

        assert!(controller.handle_error(&Error::Unauthorized).unwrap());
        assert!(!controller.is_authenticated());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("token"));

        assert!(store.load().unwrap().is_none());
        store.save(&Session::new("file-token")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().token(), "file-token");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }
}
