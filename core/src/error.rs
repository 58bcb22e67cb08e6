//! Resolution errors.
//!
//! Every failure aborts the run before any action is invoked. Callers that
//! need exit codes can map [`ResolveError::kind`] themselves.

use thiserror::Error;

use crate::types::BoxError;

/// Errors raised while resolving a command line.
///
/// The `Display` output embeds the offending keys:
///
/// ```
/// use optree_core::ResolveError;
///
/// let err = ResolveError::UnknownKeys { keys: vec!["--foo-bar".into()] };
/// assert_eq!(err.to_string(), r#"Unknown keys: ["--foo-bar"]"#);
/// ```
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A required child option was not supplied and has no default.
    #[error("You didn't provide: {keys:?}")]
    MissingRequiredArgument { keys: Vec<String> },

    /// An option requiring a value has none from any source.
    #[error("You didn't provide a value for: {keys:?}")]
    MissingRequiredValue { keys: Vec<String> },

    /// Tokens matching no resolved key or value.
    #[error("Unknown keys: {keys:?}")]
    UnknownKeys { keys: Vec<String> },

    /// An option's action returned an error.
    #[error("action for {keys:?} failed: {source}")]
    Action {
        keys: Vec<String>,
        #[source]
        source: BoxError,
    },
}

/// Discriminant of [`ResolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingRequiredArgument,
    MissingRequiredValue,
    UnknownKeys,
    Action,
}

impl ResolveError {
    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingRequiredArgument { .. } => ErrorKind::MissingRequiredArgument,
            Self::MissingRequiredValue { .. } => ErrorKind::MissingRequiredValue,
            Self::UnknownKeys { .. } => ErrorKind::UnknownKeys,
            Self::Action { .. } => ErrorKind::Action,
        }
    }

    /// Keys of the option the error is about.
    pub fn keys(&self) -> &[String] {
        match self {
            Self::MissingRequiredArgument { keys }
            | Self::MissingRequiredValue { keys }
            | Self::UnknownKeys { keys }
            | Self::Action { keys, .. } => keys,
        }
    }
}

/// Convenience alias for results with [`ResolveError`].
pub type Result<T> = std::result::Result<T, ResolveError>;
