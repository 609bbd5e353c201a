//! Bootstrap error taxonomy.

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;

use thiserror::Error;

use crate::bootstrap::component::ComponentName;
use crate::bootstrap::mode::ExecutionMode;

/// Errors raised by the bootstrap sequencer.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// `init()` called while already initialized (or while initializing).
    #[error("application is already initialized")]
    AlreadyInitialized,

    /// The same component came up twice in one run. Always a defect in
    /// the phase table.
    #[error("component `{0}` was initialized twice in one run")]
    DuplicateComponentInit(ComponentName),

    /// A component initializer failed; the run was rolled back.
    #[error("failed to initialize component `{component}`: {source}")]
    ComponentInitializationFailed {
        component: ComponentName,
        #[source]
        source: ComponentError,
    },

    /// The operation is not allowed in the current execution mode.
    #[error("`{operation}` is not permitted in {mode} mode")]
    OperationNotPermitted {
        operation: &'static str,
        mode: ExecutionMode,
    },

    /// The operation cannot run while an `init()` is underway.
    #[error("`{operation}` is not permitted while initialization is in progress")]
    InitializationInProgress { operation: &'static str },
}

impl BootstrapError {
    /// Component the error is attributed to, if any.
    pub fn component(&self) -> Option<ComponentName> {
        match self {
            BootstrapError::DuplicateComponentInit(name) => Some(*name),
            BootstrapError::ComponentInitializationFailed { component, .. } => Some(*component),
            _ => None,
        }
    }
}

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failure reported by a component initializer.
///
/// Records where it was raised so the error log can carry a source
/// location and line number alongside the message.
#[derive(Debug)]
pub struct ComponentError {
    message: String,
    location: &'static Location<'static>,
    source: Option<BoxError>,
}

impl ComponentError {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
            source: None,
        }
    }

    /// Wrap a collaborator error, keeping it as the source.
    #[track_caller]
    pub fn wrap(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: context.into(),
            location: Location::caller(),
            source: Some(source.into()),
        }
    }

    /// The initializer's capability was required but not registered.
    #[track_caller]
    pub fn unavailable(name: ComponentName) -> Self {
        Self::new(format!("no initializer registered for required component `{name}`"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn file(&self) -> &'static str {
        self.location.file()
    }

    pub fn line(&self) -> u32 {
        self.location.line()
    }
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for ComponentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}
