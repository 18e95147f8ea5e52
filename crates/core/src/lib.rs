//! A password-authenticated, threshold-distributed LWR pseudorandom
//! function with dynamic device revocation.
//!
//! A user's high-entropy key `rw` is derived from a low-entropy password by
//! evaluating a Learning-With-Rounding inner-product PRF whose master secret
//! is split across a server and a set of devices. Verification requires the
//! cooperation of the server and a threshold number of unrevoked devices;
//! compromise of fewer than the threshold of devices, or of the server
//! alone, reveals nothing about `rw`. Devices can be revoked and the master
//! secret rotated without re-registering the user.
//!
//! This crate is the cryptographic engine only: secret generation and
//! layered sharing ([`sharing`]), the LWR PRF ([`prf`]) built on modular
//! field arithmetic and two-stage rounding ([`field`]), the combinatorial
//! group indexer ([`combinatorics`]), the verification oracle
//! ([`seal`]), device revocation and key rotation ([`revocation`]), and the
//! three-party protocol orchestrator ([`protocol`]) tying all of it
//! together over [`roles`] state. The TCP/JSON transport, configuration
//! parsing, and interactive prompting that would drive this engine in a
//! deployed system are out of scope; [`messages`] defines the wire schema
//! such a transport would serialize.

pub use self::{
    combinatorics::{Binomial, GroupIndexer},
    errors::ProtocolError,
    field::{round_to, Field, Vector},
    params::SystemParams,
    prf::{compute_alpha, compute_partial_beta, direct_eval, Alpha, PartialEvaluation},
    protocol::{key_update, register, verify},
    revocation::{rotate, session1_scalar, Membership, REVOCATION_SENTINEL},
    roles::{DeviceState, ServerState, StatusReport, UserState},
    seal::{kdf, seal, unseal, SealedVerifier, VERIFICATION_TOKEN},
    sharing::{disperse, outer_split, reconstruct, ShareRepository},
};

pub mod combinatorics;
pub mod errors;
pub mod field;
pub mod messages;
pub mod params;
pub mod prf;
pub mod protocol;
pub mod revocation;
pub mod roles;
pub mod seal;
pub mod sharing;

#[cfg(any(test, feature = "dev"))]
pub mod test_utils;
