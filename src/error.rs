use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for a single chat request.
///
/// Pre-stream failures (`Configuration`, `RequestValidation`, and an
/// `Upstream` failure before the first chunk) become non-streamed error
/// responses. Once frames are flowing, failures are reported in-band.
#[derive(Debug, Error)]
pub enum ChatError {
    // ── Config / catalog ────────────────────────────────────────────────
    #[error("configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    // ── Inbound request ─────────────────────────────────────────────────
    #[error("invalid request: {0}")]
    RequestValidation(String),

    // ── Remote inference ────────────────────────────────────────────────
    #[error("{}", upstream_display(.status, .message))]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    // ── Tool capability (downgraded to an in-stream segment) ────────────
    #[error("tool {tool} failed: {message}")]
    ToolExecution { tool: String, message: String },

    // ── Client-side reassembly ──────────────────────────────────────────
    #[error("stream: {0}")]
    Stream(#[from] StreamError),

    // ── User abort (not a fault) ────────────────────────────────────────
    #[error("cancelled")]
    Cancelled,
}

fn upstream_display(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("upstream error ({status}): {message}"),
        None => format!("upstream error: {message}"),
    }
}

impl ChatError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::RequestValidation(message.into())
    }

    /// Whether this failure is a user-initiated abort.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Stable machine-readable kind used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::RequestValidation(_) => "request_validation_error",
            Self::Upstream { .. } => "upstream_error",
            Self::ToolExecution { .. } => "tool_execution_error",
            Self::Stream(_) => "stream_error",
            Self::Cancelled => "cancellation",
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(error: reqwest::Error) -> Self {
        Self::Upstream {
            status: error.status().map(|status| status.as_u16()),
            message: crate::providers::sanitize_api_error(&error.to_string()),
        }
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("missing API key for provider {provider}")]
    MissingCredentials { provider: String },

    #[error("model {0} is not in the catalog")]
    ModelNotFound(String),

    #[error("model {0} is not active")]
    ModelInactive(String),

    #[error("invalid prompt template for model {model}: {message}")]
    PromptTemplate { model: String, message: String },
}

// ─── Stream errors (client side) ─────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StreamError {
    /// The server sent an in-band `Error:` frame.
    #[error("{0}")]
    Server(String),

    #[error("model produced no response")]
    Empty,

    /// The server rejected the request before opening a stream.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport failed: {0}")]
    Transport(String),
}
