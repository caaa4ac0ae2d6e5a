use thiserror::Error;

use crate::engine::EngineFailure;

/// Malformed persisted configuration.
///
/// Fatal to bootstrap and must be surfaced to the operator; the default lock
/// service code is never substituted once parsing of a stored value started.
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum ConfigError {
    /// A token of the persisted lock service code list is not a non-negative integer.
    #[error("invalid lock service code {token:?} at position {position}")]
    InvalidLockCode {
        /// Zero-based index of the offending token.
        position: u32,
        /// The token as stored (after trimming).
        token: String,
    },
}

/// Errors raised while bootstrapping the credential engine.
#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum BootstrapError {
    /// The engine still reports itself uninitialized after `initialize`.
    ///
    /// Unrecoverable within the process: the host must restart the engine from scratch.
    #[error("initialization_failed: engine not initialized for {application_id}")]
    InitializationFailed {
        /// Application id the initialization was attempted with.
        application_id: String,
    },
    /// The proximity policy could not be built from persisted configuration.
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigError),
}

/// Errors reported by the external credential engine.
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum EngineError {
    /// An engine call or transaction failed.
    #[error("engine error {code}: {cause_message}")]
    Transaction {
        /// Engine specific error code.
        code: String,
        /// Human readable cause reported by the engine.
        cause_message: String,
    },
    /// The engine released a request callback without reporting an outcome.
    #[error("request abandoned by the engine")]
    RequestAbandoned,
    /// Unexpected `UniFFI` callback error.
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl EngineError {
    /// Creates a transaction error from an engine code and cause.
    #[must_use]
    pub fn transaction(code: impl Into<String>, cause_message: impl Into<String>) -> Self {
        Self::Transaction {
            code: code.into(),
            cause_message: cause_message.into(),
        }
    }

    /// Returns the engine error code, or a local tag for errors raised by the SDK.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Transaction { code, .. } => code,
            Self::RequestAbandoned => "request_abandoned",
            Self::UnexpectedUniFFICallbackError(_) => "uniffi_callback",
        }
    }

    /// Returns the cause message attached to the error.
    #[must_use]
    pub fn cause_message(&self) -> &str {
        match self {
            Self::Transaction { cause_message, .. } => cause_message,
            Self::RequestAbandoned => "callback dropped without a result",
            Self::UnexpectedUniFFICallbackError(reason) => reason,
        }
    }
}

impl From<EngineFailure> for EngineError {
    fn from(failure: EngineFailure) -> Self {
        Self::Transaction {
            code: failure.code,
            cause_message: failure.cause_message,
        }
    }
}

impl From<&EngineError> for EngineFailure {
    fn from(error: &EngineError) -> Self {
        Self {
            code: error.code().to_string(),
            cause_message: error.cause_message().to_string(),
        }
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for EngineError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_accessors() {
        let error = EngineError::transaction("SDK_BUSY", "startup already running");
        assert_eq!(error.code(), "SDK_BUSY");
        assert_eq!(error.cause_message(), "startup already running");
        assert_eq!(
            error.to_string(),
            "engine error SDK_BUSY: startup already running"
        );
    }

    #[test]
    fn test_failure_round_trip_keeps_code_and_cause() {
        let failure = EngineFailure {
            code: "INVALID_INVITATION_CODE".to_string(),
            cause_message: "code expired".to_string(),
        };
        let error = EngineError::from(failure.clone());
        assert_eq!(EngineFailure::from(&error), failure);
    }

    #[test]
    fn test_config_error_names_position() {
        let error = ConfigError::InvalidLockCode {
            position: 1,
            token: "abc".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "invalid lock service code \"abc\" at position 1"
        );
        let bootstrap = BootstrapError::from(error.clone());
        assert_eq!(bootstrap.to_string(), error.to_string());
    }
}
