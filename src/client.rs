//! Blocking client for the ingest/analyze backend.
//!
//! Two endpoints are used:
//! - `POST {base}/ingest/upload` (multipart field `file`) turns a `.csv`/`.xlsx` file into a table
//! - `POST {base}/analyze/query` (JSON `{user_query, table_id}`) answers a question about it
//!
//! Transient failures (connect errors, timeouts, HTTP 5xx) are retried with a short backoff.
//! Non-2xx responses surface the backend's `detail` text.
//!
//! ```no_run
//! # use chatviz::Client;
//! let client = Client::default();
//! let table = client.upload("sales.csv")?;
//! let reply = client.query("total sales by region", &table.table_name)?;
//! println!("{}", reply.answer);
//! # Ok::<(), chatviz::ClientError>(())
//! ```
use crate::models::{ErrorBody, QueryRequest, QueryResponse, UploadResponse};
use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the backend base URL.
pub const BACKEND_URL_ENV: &str = "CHATVIZ_BACKEND_URL";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
/// Longest question the backend accepts, in characters.
pub const MAX_QUERY_LENGTH: usize = 4000;
pub const ALLOWED_UPLOAD_EXTENSIONS: [&str; 2] = ["csv", "xlsx"];

const BACKOFF_MS: [u64; 3] = [100, 300, 700];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("File upload failed: {0}")]
    Upload(String),
    #[error("Failed to process query: {0}")]
    Query(String),
}

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    http: HttpClient,
}

impl Default for Client {
    /// Base URL from `CHATVIZ_BACKEND_URL`, else `http://localhost:8000`.
    fn default() -> Self {
        let base = std::env::var(BACKEND_URL_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        Self::new(base)
    }
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(120)) // answers can take a while
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("chatviz/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("http client builder failed ({e}); using defaults");
                HttpClient::new()
            });
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Upload a `.csv` or `.xlsx` file; returns the table it was loaded into.
    pub fn upload<P: AsRef<Path>>(&self, path: P) -> Result<UploadResponse, ClientError> {
        let path = path.as_ref();
        validate_upload_path(path).map_err(ClientError::Upload)?;

        let url = format!("{}/ingest/upload", self.base_url);
        let resp = self
            .send_with_retry(|| {
                let form = Form::new().file("file", path).map_err(|e| e.to_string())?;
                Ok(self.http.post(&url).multipart(form))
            })
            .map_err(ClientError::Upload)?;
        let out: UploadResponse = decode(resp).map_err(ClientError::Upload)?;
        log::info!("uploaded {} into table {}", path.display(), out.table_name);
        Ok(out)
    }

    /// Ask a question about `table_id`.
    pub fn query(&self, question: &str, table_id: &str) -> Result<QueryResponse, ClientError> {
        let question = question.trim();
        validate_query(question, table_id).map_err(ClientError::Query)?;

        let url = format!("{}/analyze/query", self.base_url);
        let body = QueryRequest {
            user_query: question.to_string(),
            table_id: table_id.trim().to_string(),
        };
        let resp = self
            .send_with_retry(|| Ok(self.http.post(&url).json(&body)))
            .map_err(ClientError::Query)?;
        decode(resp).map_err(ClientError::Query)
    }

    /// Send, retrying connect errors, timeouts and 5xx. The final attempt's response is
    /// returned as-is so its error body can be reported.
    fn send_with_retry<F>(&self, make: F) -> Result<Response, String>
    where
        F: Fn() -> Result<RequestBuilder, String>,
    {
        let mut last_err = String::from("no attempt made");
        for (attempt, backoff_ms) in BACKOFF_MS.into_iter().enumerate() {
            let is_last = attempt + 1 == BACKOFF_MS.len();
            match make()?.send() {
                Ok(r) if r.status().is_server_error() && !is_last => {
                    log::warn!("attempt {} got HTTP {}; retrying", attempt + 1, r.status());
                }
                Ok(r) => return Ok(r),
                Err(e) if e.is_connect() || e.is_timeout() => {
                    log::warn!("attempt {} failed: {e}; retrying", attempt + 1);
                    last_err = e.to_string();
                }
                Err(e) => return Err(e.to_string()),
            }
            if !is_last {
                std::thread::sleep(Duration::from_millis(backoff_ms));
            }
        }
        Err(format!("network error: {last_err}"))
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, String> {
    let status = resp.status();
    if status.is_success() {
        return resp.json().map_err(|e| format!("decode json: {e}"));
    }
    let detail = resp
        .json::<ErrorBody>()
        .ok()
        .and_then(|b| b.detail_text())
        .unwrap_or_else(|| format!("HTTP {status}"));
    Err(detail)
}

fn validate_upload_path(path: &Path) -> Result<(), String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ALLOWED_UPLOAD_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err("Incompatible File. Please Upload file .csv/.xlsx".into())
    }
}

fn validate_query(question: &str, table_id: &str) -> Result<(), String> {
    if question.is_empty() {
        return Err("query cannot be empty".into());
    }
    if question.chars().count() > MAX_QUERY_LENGTH {
        return Err(format!("query exceeds max length {MAX_QUERY_LENGTH}"));
    }
    if table_id.trim().is_empty() {
        return Err("dataset_id cannot be empty".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Port 9 (discard) is never contacted: validation fails first.
    fn offline() -> Client {
        Client::new("http://127.0.0.1:9/")
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        assert_eq!(offline().base_url, "http://127.0.0.1:9");
    }

    #[test]
    fn rejects_unsupported_upload_extension() {
        let err = offline().upload("notes.txt").unwrap_err();
        assert_eq!(
            err.to_string(),
            "File upload failed: Incompatible File. Please Upload file .csv/.xlsx"
        );
        assert!(validate_upload_path(Path::new("Data.XLSX")).is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized_queries() {
        let c = offline();
        assert_eq!(
            c.query("   ", "t1").unwrap_err(),
            ClientError::Query("query cannot be empty".into())
        );
        let long = "x".repeat(MAX_QUERY_LENGTH + 1);
        assert!(matches!(c.query(&long, "t1"), Err(ClientError::Query(m)) if m.contains("4000")));
        assert_eq!(
            c.query("ok?", " ").unwrap_err(),
            ClientError::Query("dataset_id cannot be empty".into())
        );
    }
}
