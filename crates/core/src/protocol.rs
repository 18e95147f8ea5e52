//! The three-phase protocol state machine: Registration, Verification, and
//! Key-Update (with revocation), tying every other module together.
//!
//! Mirrors `original_source/test_2/{user,server,device}_main.cpp`'s request
//! handlers, minus the socket/JSON transport those binaries carry (out of
//! scope per `spec.md` §1/§6). Each phase is exposed as a plain function
//! operating on [`crate::roles`] state, matching the message-passing
//! boundary [`crate::messages`] models without this crate taking on a
//! transport dependency itself.

use rand::RngCore;

use crate::combinatorics::GroupIndexer;
use crate::errors::ProtocolError;
use crate::field::{Field, Vector};
use crate::params::SystemParams;
use crate::prf::{compute_alpha, compute_partial_beta, direct_eval, reconstruct, PartialEvaluation};
use crate::revocation::{rotate, session1_scalar};
use crate::roles::{DeviceState, ServerState, UserState};
use crate::seal::{seal, unseal};
use crate::sharing::{disperse, outer_split};

/// Registers a new user: samples `S`, splits and disperses it, and seals the
/// verification token under the freshly computed `rw`.
///
/// Returns the three roles' resulting state, matching spec.md §4.6's
/// Registration phase: "User sends `S_s` to Server and `{R[id][*]}` to each
/// device" is modeled here as simply handing back state already partitioned
/// per role, since the transport those sends would use is out of scope.
pub fn register<R: RngCore>(
    params: SystemParams,
    pw: &[u8],
    rng: &mut R,
) -> Result<(UserState, ServerState, Vec<DeviceState>), ProtocolError> {
    let field = Field::new(params.q());
    let secret = Vector::random(params.n(), &field, rng);
    let (sd, ss) = outer_split(&secret, &field, rng);

    let indexer = GroupIndexer::new(params.total_parties(), params.threshold());
    let mut repo = disperse(&indexer, &sd, &field, rng)?;
    for g in 1..=indexer.group_count() {
        repo.set(params.server_party_id(), g, ss.clone())?;
    }

    let devices = (1..=params.n_devices())
        .map(|id| DeviceState::new(id, params, repo.extract_party(id)))
        .collect();

    let mut server = ServerState::new(params, ss.clone());
    let rw = direct_eval(pw, &secret, &field, params.q(), params.q1(), params.p())?;
    server.verifier = Some(seal(rw, rng));

    let user = UserState {
        params,
        secret,
        sd,
        ss,
    };
    tracing::info!(n_devices = params.n_devices(), threshold = params.threshold(), "registration complete");
    Ok((user, server, devices))
}

/// One verification round: User picks `session2` and `t - 1` unrevoked
/// devices; Server collects partial evaluations (including its own) and
/// reconstructs `rw'`, returning whether it unseals the stored verifier.
///
/// Per spec.md §4.6, the combining group is always `chosen_devices ∪
/// {server}` — the server participates in every round.
pub fn verify(
    params: &SystemParams,
    server: &ServerState,
    devices: &[DeviceState],
    pw: &[u8],
    session2: &[u8],
    chosen_devices: &[usize],
) -> Result<bool, ProtocolError> {
    if chosen_devices.len() != params.threshold() - 1 {
        return Err(ProtocolError::InsufficientQuorum);
    }
    if !server.membership.can_form_quorum(params.threshold()) {
        return Err(ProtocolError::InsufficientQuorum);
    }

    let field = Field::new(params.q());
    let indexer = GroupIndexer::new(params.total_parties(), params.threshold());

    let mut device_members: Vec<usize> = chosen_devices.to_vec();
    device_members.sort_unstable();
    let mut members = device_members.clone();
    members.push(params.server_party_id());
    members.sort_unstable();
    let group_id = indexer.rank(&members)?;

    let alpha = compute_alpha(pw, session2, &field, params.n())?;

    let device_betas: Vec<PartialEvaluation> = device_members
        .iter()
        .map(|&device_id| {
            device_partial_eval(devices, device_id, &alpha, session2, group_id, &field, params)
        })
        .collect::<Result<_, _>>()?;
    let server_beta = compute_partial_beta(&alpha, &server.ss, session2, &field, params.q(), params.q1())?;

    let rw_prime = reconstruct(&device_betas, server_beta, params.q1(), params.p())?;
    let verifier = server.verifier.as_ref().ok_or(ProtocolError::NotRegistered)?;
    let outcome = match unseal(verifier, rw_prime) {
        Ok(()) => Ok(true),
        Err(ProtocolError::VerificationMismatch) => Ok(false),
        Err(other) => Err(other),
    };
    tracing::debug!(group_id, ok = ?outcome, "verification round complete");
    outcome
}

/// Looks up `device_id` among `devices` and computes its partial evaluation,
/// refusing (with [`ProtocolError::DeviceRevoked`]) if the device has marked
/// itself revoked — independent of whatever the server's membership set
/// separately records (see `roles.rs`'s `DeviceState` doc comment).
fn device_partial_eval(
    devices: &[DeviceState],
    device_id: usize,
    alpha: &crate::prf::Alpha,
    session2: &[u8],
    group_id: usize,
    field: &Field,
    params: &SystemParams,
) -> Result<PartialEvaluation, ProtocolError> {
    let device = devices
        .iter()
        .find(|d| d.device_id == device_id)
        .ok_or(ProtocolError::TransportFailure)?;
    if device.revoked {
        return Err(ProtocolError::DeviceRevoked);
    }
    let share = device.shares.get(device_id, group_id)?;
    compute_partial_beta(alpha, share, session2, field, params.q(), params.q1())
}

/// A Key-Update round: revokes the devices in `revoked`, rotates every
/// remaining share (including the server's and the user's own copy of `S`)
/// by `H(session1)`, and reseals the verification token under the rotated
/// `rw`.
///
/// Per spec.md §4.7, revoked devices are rotated by the sentinel (hashing to
/// the field's multiplicative identity) rather than excluded from the
/// rotation outright: their shares are left numerically unchanged, but they
/// are marked revoked both locally and in the server's membership set, and
/// the user's redefinition of `rw` from the rotated secret makes their old
/// partial evaluations useless regardless.
#[allow(clippy::too_many_arguments)]
pub fn key_update<R: RngCore>(
    user: &mut UserState,
    server: &mut ServerState,
    devices: &mut [DeviceState],
    pw: &[u8],
    revoked: &[usize],
    session1: &[u8],
    rng: &mut R,
) -> Result<(), ProtocolError> {
    let field = Field::new(user.params.q());

    for device in devices.iter_mut() {
        if revoked.contains(&device.device_id) {
            rotate(
                &mut device.shares,
                device.device_id,
                crate::revocation::REVOCATION_SENTINEL,
                &field,
            )?;
            device.revoked = true;
            server.membership.revoke(device.device_id);
        } else {
            rotate(&mut device.shares, device.device_id, session1, &field)?;
        }
    }

    let scalar = session1_scalar(session1, &field);
    server.ss = server.ss.scalar_mul(scalar, &field);
    user.secret = user.secret.scalar_mul(scalar, &field);
    user.sd = user.sd.scalar_mul(scalar, &field);
    user.ss = user.ss.scalar_mul(scalar, &field);

    let rw = direct_eval(
        pw,
        &user.secret,
        &field,
        user.params.q(),
        user.params.q1(),
        user.params.p(),
    )?;
    server.verifier = Some(seal(rw, rng));
    tracing::info!(revoked = ?revoked, "key update complete");
    Ok(())
}
