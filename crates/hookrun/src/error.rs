use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub const EXIT_MISSING_HOOK: u8 = 1;
pub const EXIT_MISSING_COMMAND: u8 = 2;
pub const EXIT_SERIALIZE: u8 = 3;
pub const EXIT_TRANSPORT: u8 = 4;
pub const EXIT_STATUS: u8 = 5;
pub const EXIT_CONFIG: u8 = 6;
pub const EXIT_USAGE: u8 = 64;
pub const EXIT_INTERNAL: u8 = 70;

/// Failures of hookrun itself. The command being run failing is not one of
/// these; see [`crate::exec::ExecError`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("-hook is required (or set SLACK_WEBHOOK_URL)")]
    MissingHook,

    #[error("expected a command")]
    MissingCommand,

    #[error("{0}")]
    Config(String),

    #[error("encoding notification: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("posting to webhook: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("posting to webhook failed with {status}")]
    Status { status: StatusCode, body: String },

    #[error("starting runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::MissingHook => EXIT_MISSING_HOOK,
            Error::MissingCommand => EXIT_MISSING_COMMAND,
            Error::Config(_) => EXIT_CONFIG,
            Error::Serialize(_) => EXIT_SERIALIZE,
            Error::Transport(_) => EXIT_TRANSPORT,
            Error::Status { .. } => EXIT_STATUS,
            Error::Runtime(_) => EXIT_INTERNAL,
        }
    }

    /// Response body returned alongside a non-200 status, if any.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Error::Status { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Config(format!("{err:#}"))
    }
}
