//! Device membership tracking and multiplicative key rotation.

use std::collections::BTreeSet;

use crate::errors::ProtocolError;
use crate::field::{hash_scalar, Field};
use crate::sharing::ShareRepository;

/// The conventional sentinel sent to a device being revoked: it hashes to
/// the field's multiplicative identity, so the device's *shares* are left
/// unchanged while its membership flag flips. The server enforces exclusion
/// by membership set, not by the device losing the ability to compute a
/// partial evaluation.
pub const REVOCATION_SENTINEL: &[u8] = b"1";

/// Active/revoked device id bookkeeping, kept by the server.
#[derive(Debug, Clone)]
pub struct Membership {
    active: BTreeSet<usize>,
    revoked: BTreeSet<usize>,
}

impl Membership {
    pub fn new(n_devices: usize) -> Self {
        Self {
            active: (1..=n_devices).collect(),
            revoked: BTreeSet::new(),
        }
    }

    pub fn revoke(&mut self, device_id: usize) {
        self.active.remove(&device_id);
        self.revoked.insert(device_id);
    }

    pub fn is_revoked(&self, device_id: usize) -> bool {
        self.revoked.contains(&device_id)
    }

    pub fn active_devices(&self) -> Vec<usize> {
        self.active.iter().copied().collect()
    }

    pub fn revoked_devices(&self) -> Vec<usize> {
        self.revoked.iter().copied().collect()
    }

    /// Whether at least `threshold - 1` unrevoked devices remain, the
    /// minimum needed (together with the server) to form a reconstruction
    /// group.
    pub fn can_form_quorum(&self, threshold: usize) -> bool {
        self.active.len() >= threshold.saturating_sub(1)
    }
}

/// Resolves a `session1` byte string to its rotation scalar.
///
/// The sentinel [`REVOCATION_SENTINEL`] is treated specially and always
/// resolves to the field's multiplicative identity, `1`, regardless of what
/// a generic hash of the literal byte `b"1"` would happen to produce — this
/// is the protocol-level convention the system design's glossary describes
/// ("hashed to the field's multiplicative identity"), not a property that
/// falls out of SHA-256 on its own. Every other byte string is hashed
/// normally.
pub fn session1_scalar(session1: &[u8], field: &Field) -> u64 {
    if session1 == REVOCATION_SENTINEL {
        1
    } else {
        hash_scalar(session1, field)
    }
}

/// Rotates every stored share for `party_id` (including the server's own
/// `S_s`, when `party_id` is the server) by `session1_scalar(session1)`.
///
/// After rotation, `S * sigma = S_d * sigma + S_s * sigma` still holds, and
/// every group-indexed reconstruction of `S_d * sigma` remains valid because
/// the additive-replicated structure is linear in scalar multiplication.
/// Revoked devices are rotated by the identity instead (see
/// [`session1_scalar`]): their shares are left unchanged, but the server
/// enforces their exclusion via [`Membership`], and the user redefines `rw`
/// from the rotated secret so old partial evaluations become useless to
/// them regardless.
pub fn rotate(
    repo: &mut ShareRepository,
    party_id: usize,
    session1: &[u8],
    field: &Field,
) -> Result<u64, ProtocolError> {
    let scalar = session1_scalar(session1, field);
    repo.scale_party(party_id, scalar, field);
    Ok(scalar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoking_reduces_active_and_grows_revoked() {
        let mut membership = Membership::new(4);
        assert_eq!(membership.active_devices(), vec![1, 2, 3, 4]);
        membership.revoke(3);
        assert_eq!(membership.active_devices(), vec![1, 2, 4]);
        assert_eq!(membership.revoked_devices(), vec![3]);
        assert!(membership.is_revoked(3));
    }

    #[test]
    fn quorum_check_matches_threshold_minus_one() {
        let mut membership = Membership::new(4);
        membership.revoke(1);
        membership.revoke(2);
        // 2 active devices remain; threshold 3 needs t - 1 = 2.
        assert!(membership.can_form_quorum(3));
        membership.revoke(3);
        // 1 active device remains; insufficient for threshold 3.
        assert!(!membership.can_form_quorum(3));
    }

    #[test]
    fn revocation_sentinel_resolves_to_multiplicative_identity() {
        let field = Field::new(2147483647);
        assert_eq!(session1_scalar(REVOCATION_SENTINEL, &field), 1);
    }

    #[test]
    fn rotating_with_the_sentinel_leaves_shares_unchanged() {
        use crate::combinatorics::GroupIndexer;
        use crate::sharing::{disperse, outer_split};
        use rand::SeedableRng;
        use rand_chacha::ChaCha20Rng;

        let field = Field::new(2147483647);
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let indexer = GroupIndexer::new(4, 2);
        let secret = crate::field::Vector::random(3, &field, &mut rng);
        let (sd, _ss) = outer_split(&secret, &field, &mut rng);
        let mut repo = disperse(&indexer, &sd, &field, &mut rng).unwrap();
        let before = repo.get(1, 1).unwrap().clone();
        rotate(&mut repo, 1, REVOCATION_SENTINEL, &field).unwrap();
        assert_eq!(repo.get(1, 1).unwrap(), &before);
    }
}
