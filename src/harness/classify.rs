//! Failure classification for the failover loop.

use std::fmt;

use crate::error::{Error, ExchangeErrorKind};

/// Transient network failure causes. Each one rotates the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientCause {
    DdosProtection,
    Timeout,
    Unavailable,
}

impl fmt::Display for TransientCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DdosProtection => f.write_str("ddos-protection"),
            Self::Timeout => f.write_str("timeout"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// What the failover controller does with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retry over the next route.
    Transient(TransientCause),
    /// Stop the run cleanly.
    Authentication,
    /// Stop the run cleanly.
    InvalidNonce,
    /// Market invariants or a response shape were violated.
    Structural,
    /// A required credential is missing.
    CredentialMisconfiguration,
    Unclassified,
}

impl FailureKind {
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Terminal kinds end the loop without re-raising.
    #[must_use]
    pub const fn is_clean_abort(self) -> bool {
        matches!(self, Self::Authentication | Self::InvalidNonce)
    }
}

/// Classify an exchange-reported failure kind.
#[must_use]
pub const fn classify_kind(kind: ExchangeErrorKind) -> FailureKind {
    use ExchangeErrorKind as K;
    match kind {
        K::DdosProtection | K::RateLimitExceeded => {
            FailureKind::Transient(TransientCause::DdosProtection)
        }
        K::RequestTimeout => FailureKind::Transient(TransientCause::Timeout),
        K::ExchangeNotAvailable | K::OnMaintenance => {
            FailureKind::Transient(TransientCause::Unavailable)
        }
        K::AuthenticationError | K::PermissionDenied | K::AccountSuspended => {
            FailureKind::Authentication
        }
        K::InvalidNonce => FailureKind::InvalidNonce,
        K::InsufficientFunds
        | K::InvalidOrder
        | K::OrderNotFound
        | K::BadSymbol
        | K::BadRequest
        | K::NotSupported
        | K::NetworkError
        | K::ExchangeError => FailureKind::Unclassified,
    }
}

/// Classify any harness failure.
#[must_use]
pub fn classify(err: &Error) -> FailureKind {
    match err {
        Error::Exchange(err) => classify_kind(err.kind),
        Error::Assertion(_) => FailureKind::Structural,
        Error::Credentials(_) => FailureKind::CredentialMisconfiguration,
        Error::Config(_) | Error::Json(_) | Error::Io(_) => FailureKind::Unclassified,
    }
}
