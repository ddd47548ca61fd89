//! Local persistence of the signed-in session.
//!
//! Holds `{token, user}` as JSON so the next run can skip signing in. The file
//! is only a cache: the server stays the authority on whether the token is
//! still good.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thetawaves::auth::{AuthSuccess, UserSummary};

use crate::api_client::ApiClient;

/// What is kept between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user: UserSummary,
}

impl From<AuthSuccess> for StoredSession {
    fn from(success: AuthSuccess) -> Self {
        Self {
            token: success.token,
            user: success.user,
        }
    }
}

/// JSON file holding the current session
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/thetawaves/session.json`, falling back to the working directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("thetawaves"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored session, or `None` when there is none. A corrupt file counts as
    /// no session.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };

        Ok(serde_json::from_str(&text).ok())
    }

    pub fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let text = serde_json::to_string_pretty(session).context("Failed to encode session")?;
        let mut file = self.open_private()?;
        file.write_all(text.as_bytes())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        Ok(())
    }

    /// Open the session file for writing, readable by the owner only from
    /// the moment it exists
    fn open_private(&self) -> Result<File> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        // `mode` only applies on creation; tighten a file left by an older run
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict {}", self.path.display()))?;
        }

        Ok(file)
    }

    /// Remove the stored session; a missing file is fine
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

/// Sign out on the server and remove the stored session.
///
/// The local session is removed even when the server cannot be reached; the
/// server's error is still returned.
pub async fn sign_out(client: &mut ApiClient, store: &SessionStore) -> Result<String> {
    let result = client.logout().await;
    store.clear()?;
    result
}
