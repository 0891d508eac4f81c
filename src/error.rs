//! Error types for statscache.

use thiserror::Error;

/// Result type alias for statscache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache configuration.
///
/// Cache operations themselves have no error paths: lookups report absence
/// through `Option` and mutations on absent keys are no-ops. The only
/// user-visible failure is rejecting an invalid configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl Error {
    /// Create an invalid configuration error.
    pub fn invalid_configuration<S: Into<String>>(msg: S) -> Self {
        Error::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_configuration("bad quota");
        assert_eq!(format!("{}", err), "Invalid configuration: bad quota");
    }
}
