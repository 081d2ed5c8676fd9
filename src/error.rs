//! Error types for the URNA hierarchy engine
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for the CLI
//!
//! `NotFound` and `AccessDenied` are deliberately distinct variants. Callers
//! that check authorization first get `AccessDenied` for unknown targets too,
//! so existence never leaks across branches.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::PersonId;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoNotFound = 203,
    SnapshotMalformed = 204,

    // Store errors (3xx)
    StoreUnavailable = 300,
    PersonNotFound = 301,
    PersonExists = 302,

    // Authorization errors (4xx)
    AccessDenied = 400,
    NotAuthenticated = 401,

    // Hierarchy / record errors (5xx)
    CycleRejected = 500,
    InvalidRecord = 501,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E300")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10,
            200..=299 => 20,
            300..=399 => 30,
            400..=499 => 40,
            500..=599 => 50,
            900..=999 => 90,
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error
    #[error("Snapshot error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Store Errors
    // ─────────────────────────────────────────────────────────────

    /// The person store did not answer
    #[error("Person store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Requested person does not exist
    #[error("Person not found: {id}")]
    NotFound { id: PersonId },

    /// A person with this id is already registered
    #[error("Person already registered: {id}")]
    AlreadyExists { id: PersonId },

    // ─────────────────────────────────────────────────────────────
    // Authorization Errors
    // ─────────────────────────────────────────────────────────────

    /// Requester may not act on the target
    #[error("Access denied: {requester} may not access {target}")]
    AccessDenied { requester: PersonId, target: String },

    /// No authenticated identity for the request
    #[error("Not authenticated")]
    NotAuthenticated,

    // ─────────────────────────────────────────────────────────────
    // Hierarchy / Record Errors
    // ─────────────────────────────────────────────────────────────

    /// Re-parenting would create a cycle
    #[error("Assigning {person} to {new_parent} would create a cycle")]
    CycleRejected {
        person: PersonId,
        new_parent: PersonId,
    },

    /// A record failed validation
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                _ => ErrorCode::IoRead,
            },
            Error::Json(_) => ErrorCode::SnapshotMalformed,
            Error::Toml(_) => ErrorCode::ConfigParseError,

            Error::StoreUnavailable { .. } => ErrorCode::StoreUnavailable,
            Error::NotFound { .. } => ErrorCode::PersonNotFound,
            Error::AlreadyExists { .. } => ErrorCode::PersonExists,

            Error::AccessDenied { .. } => ErrorCode::AccessDenied,
            Error::NotAuthenticated => ErrorCode::NotAuthenticated,

            Error::CycleRejected { .. } => ErrorCode::CycleRejected,
            Error::Validation { .. } => ErrorCode::InvalidRecord,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is retryable. The engine never retries by itself.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::StoreUnavailable { .. } | Error::Io(_) | Error::IoRead { .. } | Error::IoWrite { .. }
        )
    }

    /// Whether the caller should treat this as a plain refusal (redirect + flash)
    pub fn is_denial(&self) -> bool {
        matches!(self, Error::AccessDenied { .. } | Error::NotAuthenticated)
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'urna config init' to create a default configuration file.",
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'urna config validate' to see details.",
            ),
            Error::Config(_) => Some(
                "Review the configuration file and fix the invalid values.",
            ),
            Error::Json(_) => Some(
                "The snapshot must be a JSON array of person records.",
            ),
            Error::StoreUnavailable { .. } => Some(
                "The person store did not answer. Retry the request once it is reachable.",
            ),
            Error::AccessDenied { .. } => Some(
                "Only a person's own record and the people below them in the hierarchy are visible.",
            ),
            Error::CycleRejected { .. } => Some(
                "A person cannot be placed under someone they already supervise.",
            ),
            Error::AlreadyExists { .. } => Some(
                "Each identification number can only be registered once.",
            ),
            Error::Validation { .. } => Some(
                "Identification numbers have 6 to 10 digits; phone numbers have 10 digits and start with 3.",
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", self.code().as_str(), self);

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn not_found(id: &PersonId) -> Self {
        Error::NotFound { id: id.clone() }
    }

    pub fn access_denied(requester: &PersonId, target: impl fmt::Display) -> Self {
        Error::AccessDenied {
            requester: requester.clone(),
            target: target.to_string(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Error::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
