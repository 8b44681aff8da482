use thiserror::Error;

/// HTTP statuses that are worth another attempt.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },

    #[error("{backend} returned HTTP {status}")]
    Status { backend: String, status: u16 },

    #[error("{backend} error: {message}")]
    Backend { backend: String, message: String },

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<LoaderError>,
    },
}

/// Coarse classification used for logging and telemetry labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeout, refused connection, DNS, truncated body
    Transport,
    /// Backend answered, but not with something usable
    Semantic,
    Config,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Semantic => "semantic",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        }
    }
}

impl LoaderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoaderError::Http(_) | LoaderError::Transport { .. } => ErrorKind::Transport,
            LoaderError::Status { status, .. } if RETRYABLE_STATUSES.contains(status) => {
                ErrorKind::Transport
            }
            LoaderError::Json(_) | LoaderError::Status { .. } | LoaderError::Backend { .. } => {
                ErrorKind::Semantic
            }
            LoaderError::Toml(_) | LoaderError::Config(_) => ErrorKind::Config,
            LoaderError::Io(_) => ErrorKind::Io,
            LoaderError::RetriesExhausted { last, .. } => last.kind(),
        }
    }

    /// Whether a fresh attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LoaderError::Transport { .. } => true,
            LoaderError::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
            _ => false,
        }
    }

    pub fn transport(err: reqwest::Error) -> Self {
        LoaderError::Transport {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;
