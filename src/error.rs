//! Unified error types for delivery-docs.
//!
//! The hierarchy separates recoverable domain errors, which the computation
//! pipeline renders as inline error content, from runtime failures that must
//! reach the foreground context.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for delivery-docs operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DeliveryError {
    /// Recoverable domain error (bad parameter, missing setting, ...)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Non-recoverable error raised while computing information
    #[error("Runtime failure: {0}")]
    InternalRuntime(String),

    /// Failure reported by a version-control collaborator
    #[error("Version control error in {adapter}: {message}")]
    VersionControl { adapter: String, message: String },

    /// Failure reported by an ALM (issue tracker) collaborator
    #[error("ALM error in {adapter}: {message}")]
    Alm { adapter: String, message: String },

    /// Lookup of a registered item failed
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// Parameters handed to a strategy or tree operation are invalid
    #[error("Invalid parameters for {target}: {message}")]
    InvalidParameters { target: String, message: String },

    /// A persisted project references a plugin that is not registered
    #[error("Unknown {kind} '{name}' referenced by project")]
    UnknownStrategy { kind: &'static str, name: String },

    /// Errors while reading or writing a project or document
    #[error("Persistence failed: {context}")]
    Persistence {
        context: String,
        #[source]
        source: PersistenceErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Specific persistence error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PersistenceErrorKind {
    #[error("Invalid XML structure: {0}")]
    InvalidXml(String),

    #[error("Unexpected element <{found}>, expected <{expected}>")]
    UnexpectedElement { expected: String, found: String },

    #[error("Missing required attribute '{attribute}' on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("Invalid value '{value}' for '{field}'")]
    InvalidValue { field: String, value: String },

    #[error("XML write failed: {0}")]
    Write(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for delivery-docs operations
pub type Result<T> = std::result::Result<T, DeliveryError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl DeliveryError {
    /// Create an internal (recoverable) error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a runtime failure
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::InternalRuntime(message.into())
    }

    /// Create a version-control error for the named adapter
    pub fn vcs(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VersionControl {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    /// Create an ALM error for the named adapter
    pub fn alm(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Alm {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create an invalid-parameters error
    pub fn invalid_parameters(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create an unknown-strategy error
    pub fn unknown_strategy(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownStrategy {
            kind,
            name: name.into(),
        }
    }

    /// Create a persistence error with context
    pub fn persistence(context: impl Into<String>, source: PersistenceErrorKind) -> Self {
        Self::Persistence {
            context: context.into(),
            source,
        }
    }

    /// Create a persistence error for malformed XML
    pub fn invalid_xml(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::persistence(context, PersistenceErrorKind::InvalidXml(message.into()))
    }

    /// Create a persistence error for a missing attribute
    pub fn missing_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::persistence(
            "missing attribute",
            PersistenceErrorKind::MissingAttribute {
                element: element.into(),
                attribute: attribute.into(),
            },
        )
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error may be rendered inline as error content.
    ///
    /// Runtime failures are excluded: they have to be surfaced to the
    /// foreground context instead.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InternalRuntime(_))
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for DeliveryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<quick_xml::Error> for DeliveryError {
    fn from(err: quick_xml::Error) -> Self {
        Self::invalid_xml("XML processing", err.to_string())
    }
}

impl From<regex::Error> for DeliveryError {
    fn from(err: regex::Error) -> Self {
        Self::internal(format!("invalid pattern: {err}"))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings are chained outermost first:
///
/// ```ignore
/// use delivery_docs::error::ErrorContext;
///
/// let project = Project::load(&path, &registry)
///     .with_context(|| format!("loading {}", path.display()))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<DeliveryError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: DeliveryError, new_ctx: &str) -> DeliveryError {
    match err {
        DeliveryError::Internal(msg) => DeliveryError::Internal(chain_context(new_ctx, &msg)),
        DeliveryError::InternalRuntime(msg) => {
            DeliveryError::InternalRuntime(chain_context(new_ctx, &msg))
        }
        DeliveryError::VersionControl { adapter, message } => DeliveryError::VersionControl {
            adapter,
            message: chain_context(new_ctx, &message),
        },
        DeliveryError::Alm { adapter, message } => DeliveryError::Alm {
            adapter,
            message: chain_context(new_ctx, &message),
        },
        DeliveryError::InvalidParameters { target, message } => {
            DeliveryError::InvalidParameters {
                target,
                message: chain_context(new_ctx, &message),
            }
        }
        DeliveryError::Persistence {
            context: existing,
            source,
        } => DeliveryError::Persistence {
            context: chain_context(new_ctx, &existing),
            source,
        },
        DeliveryError::Io {
            path,
            message,
            source,
        } => DeliveryError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        DeliveryError::Config(msg) => DeliveryError::Config(chain_context(new_ctx, &msg)),
        // Lookup errors are identified by their name alone.
        other @ (DeliveryError::NotFound { .. } | DeliveryError::UnknownStrategy { .. }) => other,
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an internal error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| DeliveryError::Internal(context.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeliveryError::not_found("import strategy", "svn");
        assert_eq!(err.to_string(), "import strategy 'svn' not found");

        let err = DeliveryError::missing_attribute("delivery", "name");
        assert!(err.to_string().contains("Persistence"));
    }

    #[test]
    fn test_io_error_carries_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = DeliveryError::io("/path/to/project.xml", io_err);
        assert!(err.to_string().contains("/path/to/project.xml"));
    }

    #[test]
    fn test_context_chaining_multiple_levels() {
        fn inner() -> Result<()> {
            Err(DeliveryError::invalid_xml("base", "eof"))
        }

        fn middle() -> Result<()> {
            inner().context("middle layer")
        }

        fn outer() -> Result<()> {
            middle().context("outer layer")
        }

        match outer() {
            Err(DeliveryError::Persistence { context, .. }) => {
                assert_eq!(context, "outer layer: middle layer: base");
            }
            other => panic!("Expected Persistence error, got {other:?}"),
        }
    }

    #[test]
    fn test_lookup_errors_keep_identity() {
        let err: Result<()> = Err(DeliveryError::unknown_strategy("strategy", "svn-log"));
        match err.context("loading project") {
            Err(DeliveryError::UnknownStrategy { name, .. }) => assert_eq!(name, "svn-log"),
            other => panic!("Expected UnknownStrategy, got {other:?}"),
        }
    }

    #[test]
    fn test_recoverability() {
        assert!(DeliveryError::vcs("git", "no repository").is_recoverable());
        assert!(DeliveryError::internal("bad").is_recoverable());
        assert!(!DeliveryError::runtime("adapter crashed").is_recoverable());
    }

    #[test]
    fn test_option_context() {
        let none_value: Option<i32> = None;
        match none_value.context_none("missing value") {
            Err(DeliveryError::Internal(msg)) => assert_eq!(msg, "missing value"),
            other => panic!("Expected Internal error, got {other:?}"),
        }
        assert_eq!(Some(3).context_none("unused").unwrap(), 3);
    }
}
