//! OKX request signing.
//!
//! Every REST call to the OKX Web3 API carries an `OK-ACCESS-SIGN` header: a
//! base64 HMAC-SHA256 over `timestamp + METHOD + path + ?query + body`, keyed
//! with the account secret. Timestamps are taken per call so a signature is
//! never reused.

use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Timestamp layout OKX expects, e.g. `2024-05-01T12:00:00.000Z`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// API key material. Any field may be absent; signing still proceeds and the
/// remote side rejects the call.
#[derive(Debug, Clone, Default)]
pub struct OkxCredentials {
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub passphrase: Option<String>,
    pub project_id: Option<String>,
}

/// Header set attached to one outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OkxHeaders {
    pub api_key: String,
    pub signature: String,
    pub timestamp: String,
    pub passphrase: String,
    pub project_id: Option<String>,
}

impl OkxHeaders {
    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        insert_header(&mut headers, "ok-access-key", &self.api_key);
        insert_header(&mut headers, "ok-access-sign", &self.signature);
        insert_header(&mut headers, "ok-access-timestamp", &self.timestamp);
        insert_header(&mut headers, "ok-access-passphrase", &self.passphrase);
        if let Some(project) = &self.project_id {
            insert_header(&mut headers, "ok-access-project", project);
        }
        headers
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(e) => warn!("Dropping header {} with invalid value: {}", name, e),
    }
}

#[derive(Debug, Clone)]
pub struct OkxAuth {
    credentials: OkxCredentials,
}

impl OkxAuth {
    pub fn new(credentials: OkxCredentials) -> Self {
        Self { credentials }
    }

    /// Compute the signature for an already fixed timestamp.
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        query: &str,
        body: &str,
    ) -> String {
        let prehash = prehash_string(timestamp, method, request_path, query, body);
        let secret = self.credentials.secret_key.as_deref().unwrap_or_default();

        // HMAC accepts keys of any length, including empty ones.
        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(prehash.as_bytes());
        general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Build the header set for a request signed at the current instant.
    pub fn headers(&self, method: &str, request_path: &str, query: &str, body: &str) -> OkxHeaders {
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        self.headers_at(&timestamp, method, request_path, query, body)
    }

    /// Build the header set for a request signed at `timestamp`.
    pub fn headers_at(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        query: &str,
        body: &str,
    ) -> OkxHeaders {
        let creds = &self.credentials;
        if creds.api_key.is_none() || creds.secret_key.is_none() || creds.passphrase.is_none() {
            warn!("OKX API key, secret, or passphrase is not set. API calls may fail.");
        }
        if creds.project_id.is_none() {
            warn!("OKX_PROJECT_ID is not set. Some API calls might require it.");
        }

        OkxHeaders {
            api_key: creds.api_key.clone().unwrap_or_default(),
            signature: self.sign(timestamp, method, request_path, query, body),
            timestamp: timestamp.to_string(),
            passphrase: creds.passphrase.clone().unwrap_or_default(),
            project_id: creds.project_id.clone(),
        }
    }
}

/// `timestamp + METHOD + path + ("?" + query) + body`
pub fn prehash_string(
    timestamp: &str,
    method: &str,
    request_path: &str,
    query: &str,
    body: &str,
) -> String {
    let query = if query.is_empty() {
        String::new()
    } else {
        format!("?{}", query)
    };
    format!("{}{}{}{}{}", timestamp, method.to_uppercase(), request_path, query, body)
}
