use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.deployment_id")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected dimensions, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "image_preparer", "oauth_provider")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the client library.
///
/// Variants follow the failure taxonomy of the streaming session: synchronous
/// precondition failures (`Configuration`, `Session`), collaborator failures
/// (`Credential`, `Preparation`), and transport failures (`Transport`,
/// `Remote`, `Io`). Nothing in this layer retries; errors always propagate to
/// the triggering call or, for mid-stream failures, to the error event.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Session error: {message}{}", format_context(.context))]
    Session {
        message: String,
        context: ErrorContext,
    },

    #[error("Credential error: {message}{}", format_context(.context))]
    Credential {
        message: String,
        context: ErrorContext,
    },

    #[error("Preparation error: {message}{}", format_context(.context))]
    Preparation {
        message: String,
        context: ErrorContext,
    },

    #[error("Transport error: {message}{}", format_context(.context))]
    Transport {
        message: String,
        context: ErrorContext,
    },

    /// Request-level error reported by the remote service inside a response
    /// envelope (as opposed to a transport-level failure).
    #[error("Remote error: {message}")]
    Remote { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a session-state error (e.g. submit before open).
    pub fn session(msg: impl Into<String>) -> Self {
        Error::Session {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a credential acquisition error.
    pub fn credential(msg: impl Into<String>) -> Self {
        Error::Credential {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a payload preparation error.
    pub fn preparation(msg: impl Into<String>) -> Self {
        Error::Preparation {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Error::Transport {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a remote (service-reported) error.
    pub fn remote(msg: impl Into<String>) -> Self {
        Error::Remote {
            message: msg.into(),
        }
    }

    /// Create a preparation error with structured context.
    pub fn preparation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Preparation {
            message: msg.into(),
            context,
        }
    }

    /// Create a transport error with structured context.
    pub fn transport_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Transport {
            message: msg.into(),
            context,
        }
    }

    /// Create a credential error with structured context.
    pub fn credential_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Credential {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Session { context, .. }
            | Error::Credential { context, .. }
            | Error::Preparation { context, .. }
            | Error::Transport { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Whether this error is a session-state precondition failure.
    pub fn is_session(&self) -> bool {
        matches!(self, Error::Session { .. })
    }
}
