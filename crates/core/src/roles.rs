//! Per-role process state for User, Server, and Device.
//!
//! Mirrors `original_source/test_2/{user,server,device}_main.cpp`'s state
//! structs, minus the socket/stdout scaffolding those binaries carry (out of
//! scope per `spec.md` §1). Each struct's methods take `&mut self` and are
//! not `Sync`-wrapped: the Rust-idiomatic expression of "single-threaded,
//! one request fully completes before the next is accepted" (`spec.md` §5).

use crate::field::Vector;
use crate::params::SystemParams;
use crate::revocation::Membership;
use crate::seal::SealedVerifier;
use crate::sharing::ShareRepository;

/// The user's registration-time state: the master secret and its outer
/// split. Kept only by the user (the party who can recompute `rw` directly);
/// never transmitted as a whole.
#[derive(Debug, Clone)]
pub struct UserState {
    pub params: SystemParams,
    pub secret: Vector,
    pub sd: Vector,
    pub ss: Vector,
}

/// The server's persistent state: its outer share, system parameters,
/// device membership, and the sealed verification oracle.
#[derive(Debug, Clone)]
pub struct ServerState {
    pub params: SystemParams,
    pub ss: Vector,
    pub membership: Membership,
    pub verifier: Option<SealedVerifier>,
}

impl ServerState {
    pub fn new(params: SystemParams, ss: Vector) -> Self {
        let n_devices = params.n_devices();
        Self {
            params,
            ss,
            membership: Membership::new(n_devices),
            verifier: None,
        }
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            n_devices: self.params.n_devices(),
            t: self.params.threshold(),
            active_devices: self.membership.active_devices(),
            revoked_devices: self.membership.revoked_devices(),
        }
    }
}

/// A single device's persistent state: its per-group shares and revocation
/// flag. `revoked` is the device's own record of its status — it refuses to
/// answer verification requests once set, independent of whatever the
/// server's membership set says (defense in depth: a device that somehow
/// missed a membership update must still not participate).
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub device_id: usize,
    pub params: SystemParams,
    pub shares: ShareRepository,
    pub revoked: bool,
}

impl DeviceState {
    pub fn new(device_id: usize, params: SystemParams, shares: ShareRepository) -> Self {
        Self {
            device_id,
            params,
            shares,
            revoked: false,
        }
    }
}

/// Snapshot of server-side membership, as reported by the `status` /
/// `status_response` wire messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub n_devices: usize,
    pub t: usize,
    pub active_devices: Vec<usize>,
    pub revoked_devices: Vec<usize>,
}
