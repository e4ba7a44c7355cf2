//! Configuration module for environment variables and application settings

use std::env;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::warn;

use crate::agent::ai_client::{DEFAULT_MODEL, OPENAI_BASE_URL};
use crate::okx::OkxCredentials;
use crate::okx::client::OKX_BASE_URL;
use crate::session::store::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL};

#[derive(Clone)]
pub struct Config {
    pub solana: SolanaConfig,
    pub openai: OpenAiConfig,
    pub okx: OkxConfig,
    pub server: ServerConfig,
    pub sessions: SessionConfig,
    /// Timeout applied to every outbound HTTP request
    pub http_timeout: Duration,
}

#[derive(Clone)]
pub struct SolanaConfig {
    /// Base58 encoded keypair used to sign swaps
    pub private_key: String,
    pub rpc_url: String,
    /// Overrides the keypair's public key for wallet-defaulted parameters
    pub wallet_address: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Clone)]
pub struct OkxConfig {
    pub credentials: OkxCredentials,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl: Duration,
    pub max_sessions: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{} environment variable is required", key));
        let parsed = |key: &str, default: u64| -> Result<u64> {
            match get(key) {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| anyhow!("{} must be a non-negative integer, got '{}'", key, raw)),
                None => Ok(default),
            }
        };

        let credentials = OkxCredentials {
            api_key: get("OKX_API_KEY"),
            secret_key: get("OKX_SECRET_KEY"),
            passphrase: get("OKX_API_PASSPHRASE"),
            project_id: get("OKX_PROJECT_ID"),
        };
        if credentials.api_key.is_none() || credentials.secret_key.is_none() || credentials.passphrase.is_none() {
            warn!("OKX API credentials are not fully set. Some OKX DEX features might not work.");
        }

        let port = parsed("PORT", 3001)?;
        let port = u16::try_from(port).map_err(|_| anyhow!("PORT must fit in 16 bits, got {}", port))?;

        Ok(Self {
            solana: SolanaConfig {
                private_key: required("SOLANA_PRIVATE_KEY")?,
                rpc_url: required("RPC_URL")?,
                wallet_address: get("WALLET_ADDRESS"),
            },

            openai: OpenAiConfig {
                api_key: required("OPENAI_API_KEY")?,
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            },

            okx: OkxConfig {
                credentials,
                base_url: get("OKX_BASE_URL").unwrap_or_else(|| OKX_BASE_URL.to_string()),
            },

            server: ServerConfig {
                host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
            },

            sessions: SessionConfig {
                ttl: Duration::from_secs(parsed("SESSION_TTL_SECS", DEFAULT_SESSION_TTL.as_secs())?),
                max_sessions: parsed("MAX_SESSIONS", DEFAULT_MAX_SESSIONS as u64)? as usize,
            },

            http_timeout: Duration::from_secs(parsed("HTTP_TIMEOUT_SECS", 30)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SOLANA_PRIVATE_KEY", "key"),
        ("RPC_URL", "https://api.mainnet-beta.solana.com"),
        ("OPENAI_API_KEY", "sk-test"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.base_url, "https://api.openai.com");
        assert_eq!(config.okx.base_url, "https://web3.okx.com");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.sessions.ttl, Duration::from_secs(86_400));
        assert_eq!(config.sessions.max_sessions, 10_000);
        assert!(config.solana.wallet_address.is_none());
        assert!(config.okx.credentials.api_key.is_none());
    }

    #[test]
    fn test_each_required_variable() {
        for missing in REQUIRED {
            let pairs: Vec<(&str, &str)> = REQUIRED.iter().copied().filter(|(k, _)| k != &missing.0).collect();
            let err = Config::from_lookup(lookup(&pairs)).err().unwrap();
            assert!(err.to_string().contains(missing.0));
        }
    }

    #[test]
    fn test_blank_values_are_unset() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("WALLET_ADDRESS", "  "));
        pairs.push(("OKX_PROJECT_ID", ""));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.solana.wallet_address.is_none());
        assert!(config.okx.credentials.project_id.is_none());

        let mut blank_key = REQUIRED.to_vec();
        blank_key[2] = ("OPENAI_API_KEY", "");
        assert!(Config::from_lookup(lookup(&blank_key)).is_err());
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("PORT", "8080"), ("OKX_API_KEY", "k"), ("MAX_SESSIONS", "5")]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.okx.credentials.api_key.as_deref(), Some("k"));
        assert_eq!(config.sessions.max_sessions, 5);

        let mut bad = REQUIRED.to_vec();
        bad.push(("PORT", "70000"));
        assert!(Config::from_lookup(lookup(&bad)).is_err());
        bad.pop();
        bad.push(("HTTP_TIMEOUT_SECS", "soon"));
        assert!(Config::from_lookup(lookup(&bad)).is_err());
    }
}
