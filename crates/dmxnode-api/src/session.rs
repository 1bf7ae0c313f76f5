use std::sync::{Arc, RwLock};

use secrecy::SecretString;

use crate::error::Error;

/// Persistent home for the bearer token returned by `auth/login`.
///
/// The client reads it once on construction and writes through on
/// every login/logout, so a token survives process restarts when the
/// backing store does (keyring in the CLI).
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<SecretString>, Error>;
    fn save(&self, token: &SecretString) -> Result<(), Error>;
    fn clear(&self) -> Result<(), Error>;
}

/// Process-local token store. Used in tests and when no keyring is available.
#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    token: Arc<RwLock<Option<SecretString>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(SecretString::from(token.into())))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        let guard = self
            .token
            .read()
            .map_err(|_| Error::TokenStore("token lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), Error> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| Error::TokenStore("token lock poisoned".into()))?;
        *guard = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| Error::TokenStore("token lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}
