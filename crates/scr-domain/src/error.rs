//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error source carried by the contextual variants
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the Service Component Runtime
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (with context)
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxError>,
    },

    /// Invalid or conflicting component declaration, or bad engine configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxError>,
    },

    /// Target filter could not be parsed
    #[error("Invalid filter {filter:?}: {message}")]
    Filter {
        /// The offending filter string
        filter: String,
        /// What went wrong
        message: String,
    },

    /// Instantiation or activation of a component instance failed
    #[error("Build of component {component} failed: {message}")]
    Build {
        /// Component name
        component: String,
        /// Description of the failure
        message: String,
        /// Cause raised by user code, if any
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A bind, unbind or deactivate callback failed
    #[error("Lifecycle error: {message}")]
    Lifecycle {
        /// Description of the failure
        message: String,
        /// Cause raised by user code, if any
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Service registry operation failed
    #[error("Registry error: {message}")]
    Registry {
        /// Description of the registry error
        message: String,
    },

    /// Resource not found error
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Entry point called on something that was already torn down
    #[error("Already disposed: {resource}")]
    Disposed {
        /// The disposed resource
        resource: String,
    },

    /// Failure of an infrastructure adapter
    #[error("Infrastructure error: {message}")]
    Infrastructure {
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxError>,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

// Basic error creation methods
impl Error {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a disposed error
    pub fn disposed<S: Into<String>>(resource: S) -> Self {
        Self::Disposed {
            resource: resource.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a registry error
    pub fn registry<S: Into<String>>(message: S) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// Create an infrastructure error
    pub fn infrastructure<S: Into<String>>(message: S) -> Self {
        Self::Infrastructure {
            message: message.into(),
            source: None,
        }
    }

    /// Create an infrastructure error with source
    pub fn infrastructure_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Infrastructure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a filter parse error
    pub fn filter<F: Into<String>, S: Into<String>>(filter: F, message: S) -> Self {
        Self::Filter {
            filter: filter.into(),
            message: message.into(),
        }
    }
}

// Configuration error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Lifecycle error creation methods
impl Error {
    /// Create a build error for a component
    pub fn build<C: Into<String>, S: Into<String>>(component: C, message: S) -> Self {
        Self::Build {
            component: component.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a build error caused by user code
    pub fn build_with_source<C: Into<String>, S: Into<String>>(
        component: C,
        message: S,
        source: anyhow::Error,
    ) -> Self {
        Self::Build {
            component: component.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a lifecycle error caused by user code
    pub fn lifecycle<S: Into<String>>(message: S, source: anyhow::Error) -> Self {
        Self::Lifecycle {
            message: message.into(),
            source: Some(source),
        }
    }

    /// True for failures of a single build that must not affect sibling work
    pub fn is_build_failure(&self) -> bool {
        matches!(self, Self::Build { .. })
    }
}
