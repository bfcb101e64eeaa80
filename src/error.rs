//! Error taxonomy shared by every component.
//!
//! Only codec errors and precondition violations are expected to reach a
//! caller. Everything else is logged by the component that detected it and
//! turned into a no-op.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Codec input did not match the grammar it was parsed against.
    #[error("malformed address {input:?}: expected {grammar}")]
    MalformedAddress {
        grammar: &'static str,
        input: String,
    },

    /// The object graph has nothing at the requested path.
    #[error("no live endpoint for {address}")]
    UnresolvedEndpoint { address: String },

    #[error("precondition violated: {0}")]
    PreconditionViolated(String),

    #[error("unsupported style {style:?} for {address}")]
    UnsupportedStyle { address: String, style: String },

    #[error("reply for {address} must carry exactly 1 argument, got {count}")]
    MalformedReply { address: String, count: usize },

    #[error("reply for untracked address {address}")]
    UnknownEndpoint { address: String },
}

impl SyncError {
    pub(crate) fn malformed(grammar: &'static str, input: impl Into<String>) -> Self {
        SyncError::MalformedAddress {
            grammar,
            input: input.into(),
        }
    }

    pub(crate) fn unresolved(address: impl Into<String>) -> Self {
        SyncError::UnresolvedEndpoint {
            address: address.into(),
        }
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
