//! Persistence of the Matrix login between restarts.
//!
//! The session directory holds two entries:
//!
//! - `session`: JSON file with the access token of the device and the last
//!   sync token
//! - `sqlite`: the SDK state store, encryption keys included

use std::path::Path;

use anyhow::{Context, Result, bail};
use log::{debug, trace};
use matrix_sdk::authentication::matrix::MatrixSession;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::utils::get_path;

/// Content of the `session` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    login: MatrixSession,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync_token: Option<String>,
}

/// Login state stored in the session directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// Session found on disk when the store was opened
    stored: Option<StoredSession>,
    sqlite_path: String,
    session_path: String,
}

impl SessionStore {
    /// Opens the store in `dir_path`.
    ///
    /// A missing or unreadable session file means the bot has to log in
    /// again, it is not an error.
    pub async fn open(dir_path: &str) -> Result<SessionStore> {
        fs::create_dir_all(dir_path)
            .await
            .with_context(|| format!("cannot create session directory {dir_path}"))?;

        let sqlite_path = get_path(dir_path, "sqlite");
        let session_path = get_path(dir_path, "session");
        debug!("session file {session_path}, state store {sqlite_path}");

        let stored = match SessionStore::read(&session_path).await {
            Ok(stored) => Some(stored),
            Err(err) => {
                debug!("no usable session: {err:#}");
                None
            }
        };

        Ok(SessionStore {
            stored,
            sqlite_path,
            session_path,
        })
    }

    async fn read(session_path: &str) -> Result<StoredSession> {
        if !Path::new(session_path).exists() {
            bail!("session file does not exist");
        }

        let content = fs::read_to_string(session_path).await?;
        let stored = serde_json::from_str(&content).context("invalid session file")?;
        Ok(stored)
    }

    pub fn sqlite_path(&self) -> &str {
        &self.sqlite_path
    }

    /// Login of a previous run, if any.
    pub fn login(&self) -> Option<&MatrixSession> {
        self.stored.as_ref().map(|stored| &stored.login)
    }

    /// Sync token of a previous run, if any.
    pub fn sync_token(&self) -> Option<String> {
        self.stored
            .as_ref()
            .and_then(|stored| stored.sync_token.clone())
    }

    /// Writes a fresh login, dropping any previous sync token.
    pub async fn save_login(&self, login: &MatrixSession) -> Result<()> {
        let stored = StoredSession {
            login: login.clone(),
            sync_token: None,
        };
        fs::write(&self.session_path, serde_json::to_string(&stored)?).await?;

        trace!("login persisted");
        Ok(())
    }

    /// Replaces the sync token in the session file.
    pub async fn save_sync_token(&self, sync_token: String) -> Result<()> {
        let mut stored = SessionStore::read(&self.session_path).await?;
        stored.sync_token = Some(sync_token);
        fs::write(&self.session_path, serde_json::to_string(&stored)?).await?;

        trace!("sync token persisted");
        Ok(())
    }
}
