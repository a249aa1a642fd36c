// src/fetch/auth.rs
//! Bearer credentials for the Sheets API.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub const SCOPE_READONLY: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const EXPIRY_SKEW_SECS: i64 = 60;

/// Source of a valid access token.
pub trait CredentialProvider {
    fn access_token(&self) -> Result<String>;
}

impl<T: CredentialProvider + ?Sized> CredentialProvider for Box<T> {
    fn access_token(&self) -> Result<String> {
        (**self).access_token()
    }
}

/// A fixed token, e.g. from `GOOGLE_ACCESS_TOKEN`.
pub struct StaticToken(pub String);

impl CredentialProvider for StaticToken {
    fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// On-disk token record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Tokens without an expiry are assumed valid.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|exp| exp - Duration::seconds(EXPIRY_SKEW_SECS) <= now)
            .unwrap_or(false)
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Token file that is refreshed in place when it expires.
pub struct TokenCache {
    path: PathBuf,
    client: Client,
    token: RefCell<StoredToken>,
}

impl TokenCache {
    pub fn load<P: AsRef<Path>>(path: P, client: Client) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading token file {}", path.display()))?;
        let token: StoredToken = serde_json::from_str(&text)
            .with_context(|| format!("parsing token file {}", path.display()))?;
        Ok(Self {
            path,
            client,
            token: RefCell::new(token),
        })
    }

    fn refresh(&self) -> Result<()> {
        let current = self.token.borrow().clone();
        let (refresh, id, secret) = match (
            current.refresh_token.as_deref(),
            current.client_id.as_deref(),
            current.client_secret.as_deref(),
        ) {
            (Some(r), Some(i), Some(s)) => (r, i, s),
            _ => {
                return Err(anyhow!(
                    "token in {} expired and cannot be refreshed (missing refresh_token/client_id/client_secret)",
                    self.path.display()
                ))
            }
        };

        info!(path = %self.path.display(), "refreshing access token");
        let resp: RefreshResponse = self
            .client
            .post(&current.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh),
                ("client_id", id),
                ("client_secret", secret),
            ])
            .send()
            .with_context(|| format!("POST {}", current.token_uri))?
            .error_for_status()
            .context("token refresh rejected")?
            .json()
            .context("decoding token refresh response")?;

        let mut updated = current.clone();
        updated.access_token = resp.access_token;
        updated.expires_at = resp
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        fs::write(&self.path, serde_json::to_string_pretty(&updated)?)
            .with_context(|| format!("writing token file {}", self.path.display()))?;
        *self.token.borrow_mut() = updated;
        Ok(())
    }
}

impl CredentialProvider for TokenCache {
    fn access_token(&self) -> Result<String> {
        if self.token.borrow().needs_refresh(Utc::now()) {
            self.refresh()?;
        } else {
            debug!("cached access token still valid");
        }
        Ok(self.token.borrow().access_token.clone())
    }
}
