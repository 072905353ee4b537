//! Durable storage for the bearer token.
//!
//! The token lives under one fixed key. Nothing outside
//! [`SessionState`](super::SessionState) should touch a store directly.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use keyring::credential::{CredentialBuilderApi, CredentialPersistence};
use keyring::{default, Entry};
use tracing::debug;

/// Fixed storage key for the bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Keychain service name.
const SERVICE_NAME: &str = "vendorbook";

pub trait TokenStore: Send + Sync {
    /// Read the persisted token, `None` when nothing is stored.
    fn get(&self) -> Result<Option<String>>;

    /// Persist `token`, replacing any previous value.
    fn set(&self, token: &str) -> Result<()>;

    /// Remove the persisted token. Clearing an empty store succeeds.
    fn clear(&self) -> Result<()>;
}

/// Token kept in a single file named after [`TOKEN_KEY`].
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the token inside `dir`, which is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file {}", self.path.display()))?;
        let token = contents.trim();
        Ok(if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        })
    }

    fn set(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create token directory")?;
        }
        std::fs::write(&self.path, token).context("Failed to write token file")?;
        debug!(path = %self.path.display(), "Token persisted");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Token file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove token file"),
        }
    }
}

/// Token kept in the OS keychain.
///
/// Only built over a backend whose entries outlive the process. The mock
/// store keyring falls back to on unsupported platforms is refused.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn open() -> Result<Self> {
        Self::open_service(SERVICE_NAME)
    }

    pub fn open_service(service: &str) -> Result<Self> {
        ensure_durable(default::default_credential_builder().persistence())?;
        Ok(Self {
            service: service.to_string(),
        })
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

/// Reject backends that drop credentials when the entry or process goes away.
fn ensure_durable(persistence: CredentialPersistence) -> Result<()> {
    match persistence {
        CredentialPersistence::EntryOnly | CredentialPersistence::ProcessOnly => {
            bail!("No persistent keychain backend on this platform; use file token storage")
        }
        _ => Ok(()),
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
