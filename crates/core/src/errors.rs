//! Types and abstractions for protocol errors.

use std::fmt;

/// A protocol error, per the error kinds enumerated by the system design.
///
/// Cryptographic-invariant violations surface as immediate failures of the
/// current round; they never mutate persistent state (handlers build the
/// new state value and only swap it into `self` after every fallible step
/// has succeeded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// `t`, `T`, `n` inconsistent, or the `q > q1 > p` modulus relationship violated.
    InvalidParameter,
    /// An operation requires prior registration state that does not exist yet.
    NotRegistered,
    /// A verification request was sent to a device that has been revoked.
    DeviceRevoked,
    /// Fewer than `t - 1` unrevoked devices are available to form a group.
    InsufficientQuorum,
    /// Unsealing produced a non-canonical plaintext (rounding inconsistency or wrong password).
    VerificationMismatch,
    /// A peer was unreachable, or returned a malformed message.
    TransportFailure,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidParameter => "invalid_parameter",
            Self::NotRegistered => "not_registered",
            Self::DeviceRevoked => "device_revoked",
            Self::InsufficientQuorum => "insufficient_quorum",
            Self::VerificationMismatch => "verification_mismatch",
            Self::TransportFailure => "transport_failure",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ProtocolError {}
