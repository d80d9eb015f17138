//! Persisted login session
//!
//! Access and refresh tokens live in a small JSON file between invocations.
//! Nothing else in the crate reads ambient token state: the API client is
//! handed a `SessionStore` explicitly.

use crate::error::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Whether a JWT access token's `exp` claim is in the past
///
/// Tokens whose payload cannot be decoded are treated as expired so the
/// caller refreshes instead of sending garbage. A token without `exp`
/// never expires client-side.
pub fn token_expired(token: &str, now_secs: i64) -> bool {
    let Some(payload) = token.split('.').nth(1) else {
        return true;
    };
    let decoded = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Undecodable token payload: {}", e);
            return true;
        }
    };
    match serde_json::from_slice::<Claims>(&decoded) {
        Ok(Claims { exp: Some(exp) }) => exp < now_secs,
        Ok(Claims { exp: None }) => false,
        Err(_) => true,
    }
}

/// File-backed token storage
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored session, or `None` when logged out
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(
                    "Ignoring unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
pub(crate) fn make_token(exp: Option<i64>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = match exp {
        Some(exp) => format!(r#"{{"token_type":"access","exp":{}}}"#, exp),
        None => r#"{"token_type":"access"}"#.to_string(),
    };
    format!("{}.{}.sig", header, URL_SAFE_NO_PAD.encode(claims))
}
