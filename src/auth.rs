//! Bearer-credential persistence.
//!
//! The credential is a Google OAuth access token supplied by the user and
//! stored in `.secrets/token.json` with restrictive permissions. Obtaining
//! the token (the browser consent flow) is outside this program; splitsheet
//! only needs to know whether it currently holds an unexpired token, attach
//! it to remote calls, and discard it when the remote reports it invalid.

use crate::{utils, Result};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Tokens within this margin of expiry are treated as already expired, so a
/// call never starts with a token that dies mid-flight.
const EXPIRY_MARGIN_SECS: i64 = 300;

/// Handle to the stored bearer credential.
#[derive(Debug, Clone)]
pub struct Auth {
    token_path: PathBuf,
}

/// Serialization format of `token.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl Auth {
    pub fn new(token_path: impl Into<PathBuf>) -> Self {
        Self {
            token_path: token_path.into(),
        }
    }

    /// Stores a token that expires `expires_in_secs` from now. The file is
    /// written with 0600 permissions on Unix.
    pub async fn save_token(&self, access_token: &str, expires_in_secs: u32) -> Result<()> {
        let token = TokenFile {
            access_token: access_token.to_string(),
            expires_at: Utc::now() + Duration::seconds(i64::from(expires_in_secs)),
        };
        let content = serde_json::to_string_pretty(&token).context("Failed to serialize token")?;
        utils::write(&self.token_path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.token_path, permissions).with_context(|| {
                format!(
                    "Failed to set permissions on {}",
                    self.token_path.display()
                )
            })?;
        }
        Ok(())
    }

    /// Returns the stored token if it exists and is not within the expiry
    /// margin. A missing, corrupt or expired token file yields `None`.
    pub async fn bearer_token(&self) -> Option<String> {
        let token = self.load_token().await?;
        let cutoff = Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS);
        if token.expires_at > cutoff {
            Some(token.access_token)
        } else {
            None
        }
    }

    /// Whether an unexpired credential is currently held.
    pub async fn is_authorized(&self) -> bool {
        self.bearer_token().await.is_some()
    }

    /// When the stored token expires, if one is stored at all.
    pub async fn expiry(&self) -> Option<DateTime<Utc>> {
        self.load_token().await.map(|t| t.expires_at)
    }

    /// Discards the stored credential. Safe to call when none is stored.
    pub async fn sign_out(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.token_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Unable to remove token file {}", self.token_path.display())
            }),
        }
    }

    async fn load_token(&self) -> Option<TokenFile> {
        if !self.token_path.is_file() {
            return None;
        }
        match utils::deserialize::<TokenFile>(&self.token_path).await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Ignoring unreadable token file: {e:#}");
                None
            }
        }
    }
}
