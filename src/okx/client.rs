use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::auth::OkxAuth;
use super::error::OkxError;

pub const OKX_BASE_URL: &str = "https://web3.okx.com";

/// Thin signed HTTP client for the OKX Web3 DEX API.
///
/// Responses are returned as decoded JSON without interpreting the `code`
/// field of the OKX envelope.
#[derive(Debug, Clone)]
pub struct OkxClient {
    client: Client,
    auth: OkxAuth,
    base_url: String,
}

impl OkxClient {
    pub fn new(auth: OkxAuth, base_url: impl Into<String>, timeout: Duration) -> Result<Self, OkxError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            auth,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Signed GET with the given query parameters, in order.
    pub async fn get(&self, request_path: &str, params: &[(&str, &str)]) -> Result<Value, OkxError> {
        let query = encode_query(params);
        let headers = self.auth.headers("GET", request_path, &query, "");

        let url = if query.is_empty() {
            format!("{}{}", self.base_url, request_path)
        } else {
            format!("{}{}?{}", self.base_url, request_path, query)
        };
        debug!("OKX GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(headers.to_header_map())
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Signed POST with a JSON body. The body is serialized once so the
    /// signature covers exactly the bytes sent.
    pub async fn post(&self, request_path: &str, body: &Value) -> Result<Value, OkxError> {
        let body = serde_json::to_string(body)?;
        let headers = self.auth.headers("POST", request_path, "", &body);

        let url = format!("{}{}", self.base_url, request_path);
        debug!("OKX POST {} {}", url, body);

        let response = self
            .client
            .post(&url)
            .headers(headers.to_header_map())
            .body(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value, OkxError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(OkxError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| OkxError::Decode(format!("{}: {}", e, text)))
    }
}

/// Form-encode query parameters the same way a browser `URLSearchParams` does.
pub fn encode_query(params: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}
