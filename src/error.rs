use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("failed to parse {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown exchange '{0}': no adapter configured")]
    UnknownExchange(String),
}

/// Failure kinds a client can report.
///
/// Names follow the unified client error hierarchy so fixtures and gateway
/// bodies can name them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ExchangeErrorKind {
    #[serde(alias = "DDoSProtection")]
    DdosProtection,
    RateLimitExceeded,
    RequestTimeout,
    ExchangeNotAvailable,
    OnMaintenance,
    AuthenticationError,
    PermissionDenied,
    AccountSuspended,
    InvalidNonce,
    InsufficientFunds,
    InvalidOrder,
    OrderNotFound,
    BadSymbol,
    BadRequest,
    NotSupported,
    NetworkError,
    ExchangeError,
}

impl ExchangeErrorKind {
    /// Name as it appears in logs and gateway payloads.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DdosProtection => "DDoSProtection",
            Self::RateLimitExceeded => "RateLimitExceeded",
            Self::RequestTimeout => "RequestTimeout",
            Self::ExchangeNotAvailable => "ExchangeNotAvailable",
            Self::OnMaintenance => "OnMaintenance",
            Self::AuthenticationError => "AuthenticationError",
            Self::PermissionDenied => "PermissionDenied",
            Self::AccountSuspended => "AccountSuspended",
            Self::InvalidNonce => "InvalidNonce",
            Self::InsufficientFunds => "InsufficientFunds",
            Self::InvalidOrder => "InvalidOrder",
            Self::OrderNotFound => "OrderNotFound",
            Self::BadSymbol => "BadSymbol",
            Self::BadRequest => "BadRequest",
            Self::NotSupported => "NotSupported",
            Self::NetworkError => "NetworkError",
            Self::ExchangeError => "ExchangeError",
        }
    }

    /// Parse a kind name, accepting both the canonical and the serde spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        const ALL: [ExchangeErrorKind; 17] = [
            ExchangeErrorKind::DdosProtection,
            ExchangeErrorKind::RateLimitExceeded,
            ExchangeErrorKind::RequestTimeout,
            ExchangeErrorKind::ExchangeNotAvailable,
            ExchangeErrorKind::OnMaintenance,
            ExchangeErrorKind::AuthenticationError,
            ExchangeErrorKind::PermissionDenied,
            ExchangeErrorKind::AccountSuspended,
            ExchangeErrorKind::InvalidNonce,
            ExchangeErrorKind::InsufficientFunds,
            ExchangeErrorKind::InvalidOrder,
            ExchangeErrorKind::OrderNotFound,
            ExchangeErrorKind::BadSymbol,
            ExchangeErrorKind::BadRequest,
            ExchangeErrorKind::NotSupported,
            ExchangeErrorKind::NetworkError,
            ExchangeErrorKind::ExchangeError,
        ];
        if name == "DdosProtection" {
            return Some(Self::DdosProtection);
        }
        ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ExchangeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error reported by the client under test.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExchangeError {
    pub kind: ExchangeErrorKind,
    pub message: String,
}

impl ExchangeError {
    pub fn new(kind: ExchangeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn request_timeout(message: impl Into<String>) -> Self {
        Self::new(ExchangeErrorKind::RequestTimeout, message)
    }

    pub fn not_available(message: impl Into<String>) -> Self {
        Self::new(ExchangeErrorKind::ExchangeNotAvailable, message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ExchangeErrorKind::NotSupported, message)
    }
}

/// Post-condition and response-shape violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssertionError {
    #[error(".markets is not loaded")]
    MarketsNotLoaded,

    #[error(".symbols.length <= 0 (less than or equal to zero)")]
    EmptySymbols,

    #[error("Object.keys (.markets).length <= 0 (less than or equal to zero)")]
    EmptyMarkets,

    #[error("number of .symbols ({symbols}) is not equal to the number of .markets ({markets})")]
    SymbolCountMismatch { symbols: usize, markets: usize },

    #[error("{step}: unexpected response shape: {reason}")]
    Shape { step: &'static str, reason: String },

    #[error("{step}: expected {expected} but the call succeeded")]
    ExpectedFailure {
        step: &'static str,
        expected: ExchangeErrorKind,
    },
}

/// Credential gate failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{exchange} requires \"{credential}\" credential")]
    Missing {
        exchange: String,
        credential: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Assertion(#[from] AssertionError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short type tag used in failure logs.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::Exchange(err) => err.kind.name(),
            Self::Assertion(_) => "AssertionError",
            Self::Credentials(_) => "CredentialError",
            Self::Json(_) => "JsonError",
            Self::Io(_) => "IoError",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
