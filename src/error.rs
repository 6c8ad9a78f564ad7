//! Unified error handling for the fdportal client
//!
//! Every error carries an `ErrorCode` rendered as `FXXX`:
//! - F1XX: Authentication and session errors
//! - F2XX: Network and API errors
//! - F3XX: Credential storage I/O errors
//! - F4XX: Configuration errors
//! - F5XX: Validation and input errors
//! - F8XX: UI and interaction errors
//! - F9XX: Internal errors

use std::fmt;
use thiserror::Error;

/// Unified Result type for all fdportal operations
pub type Result<T> = std::result::Result<T, FdError>;

/// Error codes for fdportal operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (F1XX)
    /// F101: Login rejected by the server
    LoginFailed,
    /// F103: Credential past its expiry
    TokenExpired,
    /// F104: Credential could not be decoded
    MalformedCredential,
    /// F105: Server answered 401 to an authenticated call
    SessionRejected,

    // Network (F2XX)
    /// F201: HTTP request failed
    HttpError,
    /// F202: Connection timeout
    ConnectionTimeout,
    /// F204: Connection refused
    ConnectionRefused,
    /// F205: API returned error response
    ApiError,
    /// F206: Invalid API response format
    InvalidResponse,

    // Storage (F3XX)
    /// F301: Storage file not found
    FileNotFound,
    /// F302: Storage read error
    FileReadError,
    /// F303: Storage write error
    FileWriteError,

    // Configuration (F4XX)
    /// F401: Configuration error
    ConfigError,
    /// F402: Invalid endpoint URL
    InvalidEndpoint,

    // Validation (F5XX)
    /// F501: Invalid input
    InvalidInput,
    /// F502: Validation failed
    ValidationFailed,

    // UI (F8XX)
    /// F801: Dialog error
    DialogError,

    // Internal (F9XX)
    /// F901: Internal error
    InternalError,
    /// F902: Serialization error
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::LoginFailed => 101,
            ErrorCode::TokenExpired => 103,
            ErrorCode::MalformedCredential => 104,
            ErrorCode::SessionRejected => 105,

            ErrorCode::HttpError => 201,
            ErrorCode::ConnectionTimeout => 202,
            ErrorCode::ConnectionRefused => 204,
            ErrorCode::ApiError => 205,
            ErrorCode::InvalidResponse => 206,

            ErrorCode::FileNotFound => 301,
            ErrorCode::FileReadError => 302,
            ErrorCode::FileWriteError => 303,

            ErrorCode::ConfigError => 401,
            ErrorCode::InvalidEndpoint => 402,

            ErrorCode::InvalidInput => 501,
            ErrorCode::ValidationFailed => 502,

            ErrorCode::DialogError => 801,

            ErrorCode::InternalError => 901,
            ErrorCode::SerializationError => 902,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.code())
    }
}

/// Main error type for all fdportal operations
#[derive(Error, Debug)]
pub enum FdError {
    // ==================== Authentication Errors (F1XX) ====================
    /// Authentication or session failure
    #[error("[{code}] Authentication failed: {message}")]
    Authentication { code: ErrorCode, message: String },

    // ==================== Network Errors (F2XX) ====================
    /// HTTP/Network error
    #[error("[{code}] Network error: {message}")]
    Network {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// API error with status code
    #[error("[{code}] API error ({status}): {message}")]
    Api {
        code: ErrorCode,
        status: u16,
        message: String,
    },

    // ==================== Storage Errors (F3XX) ====================
    /// File or IO error
    #[error("[{code}] {context}: {message}")]
    Io {
        code: ErrorCode,
        context: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // ==================== Configuration Errors (F4XX) ====================
    /// Configuration error
    #[error("[{code}] Configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    // ==================== Validation Errors (F5XX) ====================
    /// Validation error
    #[error("[{code}] Validation error: {message}")]
    Validation { code: ErrorCode, message: String },

    /// Invalid input error
    #[error("[{code}] Invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    // ==================== UI Errors (F8XX) ====================
    /// UI/Dialog error
    #[error("[{code}] UI error: {message}")]
    Ui { code: ErrorCode, message: String },

    // ==================== Internal Errors (F9XX) ====================
    /// Internal/Unexpected error
    #[error("[{code}] Internal error: {message}")]
    Internal { code: ErrorCode, message: String },

    /// JSON serialization error
    #[error("[{code}] Serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

// ==================== Constructor Methods ====================

impl FdError {
    // --- Authentication ---

    /// Create login failure error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::LoginFailed,
            message: message.into(),
        }
    }

    /// Create token expired error
    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::TokenExpired,
            message: message.into(),
        }
    }

    /// Create malformed credential error
    pub fn malformed_credential(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::MalformedCredential,
            message: message.into(),
        }
    }

    /// Create error for a 401 answer to an authenticated call
    pub fn session_rejected(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::SessionRejected,
            message: message.into(),
        }
    }

    // --- Network ---

    /// Create network error from reqwest error
    pub fn network_from_reqwest(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::ConnectionTimeout
        } else if err.is_connect() {
            ErrorCode::ConnectionRefused
        } else {
            ErrorCode::HttpError
        };

        Self::Network {
            code,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::ApiError,
            status,
            message: message.into(),
        }
    }

    /// Create invalid response error
    pub fn invalid_response(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::InvalidResponse,
            status,
            message: message.into(),
        }
    }

    // --- Storage ---

    /// Create IO error with context
    pub fn io(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            code: ErrorCode::FileReadError,
            context: context.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create IO error from std::io::Error
    pub fn io_from_error(context: impl Into<String>, err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::FileWriteError,
            _ => ErrorCode::FileReadError,
        };

        Self::Io {
            code,
            context: context.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create storage write error
    pub fn storage_write(message: impl Into<String>) -> Self {
        Self::Io {
            code: ErrorCode::FileWriteError,
            context: "Credential storage".to_string(),
            message: message.into(),
            source: None,
        }
    }

    // --- Configuration ---

    /// Create configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration error with source
    pub fn config_from_error(err: config::ConfigError) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create invalid endpoint error
    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::InvalidEndpoint,
            message: message.into(),
            source: None,
        }
    }

    // --- Validation ---

    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
        }
    }

    /// Create invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    // --- Internal ---

    /// Create internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::InternalError,
            message: message.into(),
        }
    }

    // --- Utility Methods ---

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Api { code, .. } => *code,
            Self::Io { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::InvalidInput { code, .. } => *code,
            Self::Ui { code, .. } => *code,
            Self::Internal { code, .. } => *code,
            Self::Serialization { code, .. } => *code,
        }
    }

    /// Message without the code prefix, for display next to a form
    pub fn message(&self) -> String {
        match self {
            Self::Authentication { message, .. }
            | Self::Network { message, .. }
            | Self::Api { message, .. }
            | Self::Io { message, .. }
            | Self::Config { message, .. }
            | Self::Validation { message, .. }
            | Self::InvalidInput { message, .. }
            | Self::Ui { message, .. }
            | Self::Internal { message, .. }
            | Self::Serialization { message, .. } => message.clone(),
        }
    }

    /// Check if the error invalidates the current session
    ///
    /// Covers malformed and expired credentials and 401 answers.
    pub fn ends_session(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::MalformedCredential | ErrorCode::TokenExpired | ErrorCode::SessionRejected
        )
    }

    /// Check if the user may sensibly retry the operation by hand
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Api { status: 503, .. } | Self::Api { status: 429, .. }
        )
    }
}

// ==================== From Implementations ====================

impl From<std::io::Error> for FdError {
    fn from(err: std::io::Error) -> Self {
        Self::io_from_error("IO operation", err)
    }
}

impl From<reqwest::Error> for FdError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_from_reqwest(err)
    }
}

impl From<serde_json::Error> for FdError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for FdError {
    fn from(err: config::ConfigError) -> Self {
        Self::config_from_error(err)
    }
}

impl From<dialoguer::Error> for FdError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Ui {
            code: ErrorCode::DialogError,
            message: format!("Dialog error: {}", err),
        }
    }
}
