// src/fetch/sheets.rs
//! Google Sheets v4 REST client.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::{thread::sleep, time::Duration};
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::auth::CredentialProvider;
use super::{SheetInfo, SheetSource};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// `Title!A1:ZZ` with the title quoted the way A1 notation expects.
pub fn a1_range(title: &str, columns: &str) -> String {
    format!("'{}'!{}", title.replace('\'', "''"), columns)
}

/// Renders a JSON cell as the text a user sees.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        other => other.to_string(),
    }
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
    #[serde(default)]
    hidden: bool,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

pub struct GoogleSheets<C: CredentialProvider> {
    client: Client,
    credentials: C,
    base: Url,
}

impl<C: CredentialProvider> GoogleSheets<C> {
    pub fn new(client: Client, credentials: C) -> Result<Self> {
        Ok(Self {
            client,
            credentials,
            base: Url::parse(API_BASE)?,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("API base cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json_core<T: for<'de> Deserialize<'de>>(&self, url: &Url) -> Result<T> {
        debug!(%url, "GET");
        let token = self.credentials.access_token()?;
        self.client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .json()
            .with_context(|| format!("Decoding JSON from {}", url))
    }

    fn get_json_with_retry<T: for<'de> Deserialize<'de>>(&self, url: &Url) -> Result<T> {
        let mut attempts = 0;
        loop {
            match self.get_json_core(url) {
                Ok(v) => return Ok(v),
                Err(e) if attempts < MAX_RETRIES && is_retryable(&e) => {
                    attempts += 1;
                    let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempts - 1);
                    warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                    sleep(Duration::from_millis(backoff));
                }
                Err(e) => {
                    error!(%url, error = %e, "Giving up");
                    return Err(e);
                }
            }
        }
    }
}

/// Transport errors, 429 and 5xx are worth another attempt.
fn is_retryable(e: &anyhow::Error) -> bool {
    match e.downcast_ref::<reqwest::Error>() {
        Some(re) => match re.status() {
            Some(status) => status.as_u16() == 429 || status.is_server_error(),
            None => re.is_timeout() || re.is_connect() || re.is_request(),
        },
        None => false,
    }
}

impl<C: CredentialProvider> SheetSource for GoogleSheets<C> {
    #[instrument(level = "debug", skip(self))]
    fn list_sheets(&self, doc_id: &str) -> Result<Vec<SheetInfo>> {
        let mut url = self.url(&[doc_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(title,hidden)");
        let meta: SpreadsheetMeta = self.get_json_with_retry(&url)?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|s| SheetInfo {
                title: s.properties.title,
                hidden: s.properties.hidden,
            })
            .collect())
    }

    #[instrument(level = "debug", skip(self))]
    fn get_values(&self, doc_id: &str, title: &str, columns: &str) -> Result<Vec<Vec<String>>> {
        let range = a1_range(title, columns);
        let url = self.url(&[doc_id, "values", &range])?;
        let body: ValueRange = self.get_json_with_retry(&url)?;
        Ok(body
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}
