//! Error types for leachnet-protocol.

use thiserror::Error;

use crate::address::Address;

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or operating a protocol
/// instance.
///
/// Fatal errors (`Config`, `DuplicateAddress`) stop only the instance they
/// concern; recoverable ones are logged by the caller and the protocol
/// self-heals on the next round tick.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected at construction.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    /// An address was registered twice with the same harness.
    #[error("address {0} is already registered")]
    DuplicateAddress(Address),

    /// A message was addressed to a node the harness does not know.
    #[error("no receiver registered at {0}")]
    UnknownAddress(Address),

    /// A message type the receiver does not handle; dropped, counters
    /// untouched.
    #[error("{receiver} does not handle {kind} messages")]
    UnsupportedMessage {
        receiver: Address,
        kind: &'static str,
    },

    /// The energy probe failed; callers treat the reading as zero.
    #[error("energy probe failed: {0}")]
    EnergyProbe(String),
}
