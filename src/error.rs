//! Error types for attribute propagation runs.
//!
//! Errors are classified as fatal (abort the run before or without touching
//! objects) or per-object (captured into the result stream while the batch
//! continues).

use thiserror::Error;

/// Which side of a cross-domain join an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinSide {
    /// The directory holding the object whose attribute value is read.
    Source,
    /// The directory holding the object whose attribute is written.
    Target,
}

impl std::fmt::Display for JoinSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinSide::Source => write!(f, "source"),
            JoinSide::Target => write!(f, "target"),
        }
    }
}

/// Error that can occur during a propagation run or a cross-domain join.
#[derive(Debug, Error)]
pub enum PropagationError {
    /// Forest or domain metadata lookup failed, or a scope-wide query could
    /// not be executed. Aborts the run before any object is touched.
    #[error("scope resolution failed for '{scope}': {message}")]
    ScopeResolution { scope: String, message: String },

    /// An individual identifier could not be found or fetched.
    #[error("object lookup failed for '{identifier}': {message}")]
    ObjectLookup { identifier: String, message: String },

    /// The mutation call failed for one object.
    #[error("attribute update failed for '{identifier}' on {server}: {message}")]
    AttributeUpdate {
        identifier: String,
        server: String,
        message: String,
    },

    /// A cross-domain join precondition was violated. No mutation performed.
    #[error("{side} precondition violated for '{identifier}': {message}")]
    Precondition {
        side: JoinSide,
        identifier: String,
        message: String,
    },

    /// Required operating context or directory binding is missing.
    #[error("environment precondition not met: {message}")]
    Environment { message: String },

    /// The run configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl PropagationError {
    /// Check whether this error aborts the whole run.
    ///
    /// Per-object errors (`ObjectLookup`, `AttributeUpdate`) are recorded in
    /// the result stream and never stop the batch.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PropagationError::ObjectLookup { .. } | PropagationError::AttributeUpdate { .. }
        )
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            PropagationError::ScopeResolution { .. } => "SCOPE_RESOLUTION",
            PropagationError::ObjectLookup { .. } => "OBJECT_LOOKUP",
            PropagationError::AttributeUpdate { .. } => "ATTRIBUTE_UPDATE",
            PropagationError::Precondition { .. } => "PRECONDITION_VIOLATION",
            PropagationError::Environment { .. } => "ENVIRONMENT",
            PropagationError::InvalidConfiguration { .. } => "INVALID_CONFIG",
        }
    }

    // Convenience constructors

    /// Create a scope resolution error.
    pub fn scope_resolution(scope: impl Into<String>, message: impl Into<String>) -> Self {
        PropagationError::ScopeResolution {
            scope: scope.into(),
            message: message.into(),
        }
    }

    /// Create an object lookup error.
    pub fn object_lookup(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        PropagationError::ObjectLookup {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Create an attribute update error.
    pub fn attribute_update(
        identifier: impl Into<String>,
        server: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        PropagationError::AttributeUpdate {
            identifier: identifier.into(),
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create a precondition violation for one side of a join.
    pub fn precondition(
        side: JoinSide,
        identifier: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        PropagationError::Precondition {
            side,
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Create an environment precondition error.
    pub fn environment(message: impl Into<String>) -> Self {
        PropagationError::Environment {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        PropagationError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type for propagation operations.
pub type PropagationResult<T> = Result<T, PropagationError>;
