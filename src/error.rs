//! Error types for the service container

use thiserror::Error;

/// Errors raised while reading positional arguments.
///
/// Constructors and methods return these; the container wraps them into
/// [`DiError::Construction`] or [`DiError::MethodInvocation`] with the class
/// and method involved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgumentError {
    /// Wrong number of arguments
    #[error("expected {expected} argument(s), got {got}")]
    Arity { expected: usize, got: usize },

    /// No argument at the requested position
    #[error("missing argument at position {index}")]
    Missing { index: usize },

    /// Argument present but of the wrong kind
    #[error("argument {index} must be {expected}, found {found}")]
    Type {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Method invoked on an instance of another type
    #[error("receiver is not a {expected}")]
    Receiver { expected: &'static str },
}

/// Errors that can occur while registering or resolving services
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// A service with this name is already registered
    #[error("Service already registered: {name}")]
    DuplicateService { name: String },

    /// No service is registered under this name
    #[error("Service not found: {name}")]
    ServiceNotFound { name: String },

    /// The registered entry does not describe a buildable service
    #[error("Invalid entry for service {name}: {reason}")]
    ServiceEntryInvalid { name: String, reason: String },

    /// The initialization steps are not a list of recognized steps
    #[error("Invalid initialize steps for service {name}: {reason}")]
    InvalidInitialize { name: String, reason: String },

    /// The class reference does not resolve to a defined class
    #[error("Class not found: {class}")]
    ClassNotFound { class: String },

    /// The constructor rejected the arguments
    #[error("Failed to construct {class}: {source}")]
    Construction {
        class: String,
        #[source]
        source: ArgumentError,
    },

    /// An initialization step names a method the class does not expose in
    /// the form the step needs
    #[error("Method {method} not found on class {class}: {reason}")]
    MethodNotFound {
        class: String,
        method: String,
        reason: String,
    },

    /// A method rejected the arguments of an initialization step
    #[error("Failed to invoke {class}::{method}: {source}")]
    MethodInvocation {
        class: String,
        method: String,
        #[source]
        source: ArgumentError,
    },

    /// The resolved instance is not of the requested type
    #[error("Service {name} is not a {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
}

impl DiError {
    /// Create a ServiceNotFound error
    #[inline]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::ServiceNotFound { name: name.into() }
    }

    /// Create a DuplicateService error
    #[inline]
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateService { name: name.into() }
    }

    /// Create a ServiceEntryInvalid error
    #[inline]
    pub fn invalid_entry(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ServiceEntryInvalid {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidInitialize error
    #[inline]
    pub fn invalid_initialize(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInitialize {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a TypeMismatch error for type T
    #[inline]
    pub fn type_mismatch<T: 'static>(name: impl Into<String>) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected: std::any::type_name::<T>(),
        }
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;
