use thiserror::Error;

/// Failures raised while talking to the OKX REST API.
///
/// API-level failures (a non-zero `code` in the response envelope) are not
/// errors here: they come back as data so the agent can read and explain them.
#[derive(Error, Debug)]
pub enum OkxError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OKX API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode OKX response: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures raised by a command registry before or while dispatching a command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown OKX {registry} API command: {command}. Available commands: {}", .available.join(", "))]
    UnknownCommand {
        registry: &'static str,
        command: String,
        available: Vec<String>,
    },

    #[error("Missing required parameters for {command}: {}. Example: {example}", .missing.join(", "))]
    MissingParams {
        command: String,
        missing: Vec<String>,
        example: String,
    },

    #[error(transparent)]
    Request(#[from] OkxError),

    #[error("Swap submission failed: {0}")]
    Submission(String),
}
