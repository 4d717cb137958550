//! Error taxonomy shared by the primality tests and the certificate builder.

use rug::Integer;
use thiserror::Error;

/// Failure modes of the numeric core.
///
/// Every condition is reported to the caller; nothing in the core retries.
/// Re-running a probabilistic test with more rounds is a caller decision.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrimalityError {
    /// Non-positive candidate, zero rounds, modulus below 1, malformed record, ...
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The certificate builder popped a value that failed the trusted primality check.
    #[error("{0} is not prime")]
    NotPrime(Integer),

    /// A certificate node failed re-verification.
    #[error("certificate node {prime} is invalid: {reason}")]
    CertificateInvalid { prime: Integer, reason: String },
}

impl PrimalityError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        PrimalityError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PrimalityError>;
