use crate::cache::StoreError;
use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.manifest[2]", "namespace")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., the offending URL or status)
    pub details: Option<String>,
    /// Source of the error (e.g., "lifecycle", "config")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
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

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the proxy.
///
/// Only lifecycle, configuration and bypassed (non-GET) requests ever surface one of
/// these to a caller. Per-request failures are always translated into a stale
/// snapshot or a synthetic offline response before they leave the strategy engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    #[error("Installation failed: {message}{}", format_context(.context))]
    Installation {
        message: String,
        context: ErrorContext,
    },

    #[error("Lifecycle error: {message}{}", format_context(.context))]
    Lifecycle {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
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
    pub fn installation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Installation {
            message: msg.into(),
            context,
        }
    }

    pub fn lifecycle_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Lifecycle {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Installation { context, .. }
            | Error::Lifecycle { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// True when the error came from the transport layer (no response was observed).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_rendered_in_display() {
        let err = Error::installation_with_context(
            "manifest fetch failed",
            ErrorContext::new()
                .with_field_path("manifest[1]")
                .with_source("lifecycle"),
        );
        assert_eq!(
            err.to_string(),
            "Installation failed: manifest fetch failed (field: manifest[1], source: lifecycle)"
        );
        assert_eq!(
            err.context().and_then(|c| c.source.as_deref()),
            Some("lifecycle")
        );
    }

    #[test]
    fn test_empty_context_adds_nothing() {
        let err = Error::lifecycle_with_context("bad transition", ErrorContext::default());
        assert_eq!(err.to_string(), "Lifecycle error: bad transition");
    }

    #[test]
    fn test_transport_detection() {
        let err: Error = TransportError::Unreachable("offline".into()).into();
        assert!(err.is_transport());
        assert!(err.context().is_none());
    }
}
