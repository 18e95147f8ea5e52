//! Outer `(2,2)` secret splitting and inner combinatorial share dispersion.

use rand::RngCore;

use crate::combinatorics::GroupIndexer;
use crate::errors::ProtocolError;
use crate::field::{Field, Vector};

/// Splits `secret` into two additive shares, `secret = sd + ss`.
///
/// `sd` is sampled uniformly; `ss` is the (also marginally uniform)
/// complement. Both are needed to reconstruct `secret` exactly.
pub fn outer_split<R: RngCore>(secret: &Vector, field: &Field, rng: &mut R) -> (Vector, Vector) {
    let sd = Vector::random(secret.len(), field, rng);
    let ss = secret.sub(&sd, field);
    (sd, ss)
}

/// Flat `(party_id, group_id) -> Vector` arena.
///
/// Replaces the doubly-nested `map<party, map<group, vector>>` of the
/// original prototype with a single indexed `Vec`, sized once for the fixed
/// `(total_parties, group_count)` pair the system runs with.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    total_parties: usize,
    group_count: usize,
    shares: Vec<Option<Vector>>,
}

impl ShareRepository {
    pub fn new(total_parties: usize, group_count: usize) -> Self {
        Self {
            total_parties,
            group_count,
            shares: vec![None; total_parties * group_count],
        }
    }

    fn index(&self, party_id: usize, group_id: usize) -> Option<usize> {
        if party_id == 0
            || party_id > self.total_parties
            || group_id == 0
            || group_id > self.group_count
        {
            return None;
        }
        Some((party_id - 1) * self.group_count + (group_id - 1))
    }

    pub fn get(&self, party_id: usize, group_id: usize) -> Result<&Vector, ProtocolError> {
        let idx = self
            .index(party_id, group_id)
            .ok_or(ProtocolError::InvalidParameter)?;
        self.shares[idx]
            .as_ref()
            .ok_or(ProtocolError::NotRegistered)
    }

    pub fn set(
        &mut self,
        party_id: usize,
        group_id: usize,
        share: Vector,
    ) -> Result<(), ProtocolError> {
        let idx = self
            .index(party_id, group_id)
            .ok_or(ProtocolError::InvalidParameter)?;
        self.shares[idx] = Some(share);
        Ok(())
    }

    /// Multiplies every stored share for `party_id` by `scalar`, in place.
    ///
    /// Used by key rotation (see [`crate::revocation::rotate`]); the
    /// additive-replicated structure is linear, so this keeps every group's
    /// reconstruction of `S_d * scalar` valid.
    pub fn scale_party(&mut self, party_id: usize, scalar: u64, field: &Field) {
        for group_id in 1..=self.group_count {
            if let Some(idx) = self.index(party_id, group_id) {
                if let Some(share) = self.shares[idx].as_ref() {
                    self.shares[idx] = Some(share.scalar_mul(scalar, field));
                }
            }
        }
    }

    /// Copies out a repository holding only `party_id`'s own shares, every
    /// other party's slot left empty.
    ///
    /// A device must never retain another device's share past registration;
    /// this is what lets [`crate::protocol::register`] hand each
    /// [`crate::roles::DeviceState`] just its own row out of the full
    /// dispersion table built in one place during registration.
    pub fn extract_party(&self, party_id: usize) -> Self {
        let mut out = Self::new(self.total_parties, self.group_count);
        for group_id in 1..=self.group_count {
            if let Some(idx) = self.index(party_id, group_id) {
                out.shares[idx] = self.shares[idx].clone();
            }
        }
        out
    }
}

/// Disperses `sd` across devices `{1..t-1..total_parties-1}` for every
/// group, via additive-replicated sharing keyed to the group's
/// smallest-indexed member.
///
/// The server (party `T`, i.e. [`GroupIndexer::total_parties`]) never
/// receives a slot in this additive-replicated scheme: `S_d` is shared only
/// among the *device* members of a group, so that those devices alone
/// reconstruct it. For every group `g` unranking to members `[m_1 < .. <
/// m_t]`, let `[d_1 < .. < d_k]` be the members other than the server
/// (`k = t` if the server isn't in the group, `k = t - 1` if it is, since
/// the server always has the largest party id and so is always `m_t` when
/// present): members `d_2..d_k` get uniformly random shares, and `d_1` gets
/// `sd + sum(d_2..d_k)`, so that `R[d_1][g] - sum_{i>1} R[d_i][g] = sd`
/// exactly. This rule is applied uniformly for every `t >= 2`, including the
/// `t = 2` boundary case (see DESIGN.md for why this implementation does not
/// special-case `t = 2` into duplicating `sd` across every device).
///
/// The server's own share, `R[T][g] = S_s`, is not set here: callers attach
/// it once dispersion is complete (see [`crate::protocol::register`]). An
/// earlier version of this function included the server as an ordinary
/// additive-replication member, which meant a randomly sampled share was
/// folded into the smallest device's accumulator and then silently
/// discarded when the caller overwrote the server's slot with `S_s` —
/// breaking threshold reconstruction. Excluding the server here, and adding
/// its own partial evaluation back in at reconstruction time (see
/// [`crate::prf::reconstruct`]), is what the original implementation does.
pub fn disperse<R: RngCore>(
    indexer: &GroupIndexer,
    sd: &Vector,
    field: &Field,
    rng: &mut R,
) -> Result<ShareRepository, ProtocolError> {
    let group_count = indexer.group_count();
    let server_party_id = indexer.total_parties();
    let mut repo = ShareRepository::new(indexer.total_parties(), group_count);
    for g in 1..=group_count {
        let members = indexer.unrank(g)?;
        let device_members: Vec<usize> = members
            .into_iter()
            .filter(|&m| m != server_party_id)
            .collect();
        let mut accumulator = sd.clone();
        for &member in &device_members[1..] {
            let share = Vector::random(sd.len(), field, rng);
            accumulator = accumulator.add(&share, field);
            repo.set(member, g, share)?;
        }
        repo.set(device_members[0], g, accumulator)?;
    }
    Ok(repo)
}

/// Reconstructs `sd` from a set of device shares.
///
/// Mirrors the smallest-device-adds/rest-subtract combination rule
/// [`disperse`] used to build them. `members` must be exactly the device
/// subset that received real shares from [`disperse`] for a given group —
/// i.e. the group's members with the server excluded, sorted ascending —
/// never the server's own `S_s` row, which plays no part in this relation.
pub fn reconstruct(
    members: &[usize],
    shares: &[&Vector],
    field: &Field,
) -> Result<Vector, ProtocolError> {
    if members.len() != shares.len() || members.is_empty() {
        return Err(ProtocolError::InvalidParameter);
    }
    let mut result = shares[0].clone();
    for share in &shares[1..] {
        result = result.sub(share, field);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn field() -> Field {
        Field::new(2147483647)
    }

    #[test]
    fn share_reconstruction_recovers_sd_for_every_group() {
        let field = field();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let indexer = GroupIndexer::new(5, 3);
        let sd = Vector::random(4, &field, &mut rng);
        let repo = disperse(&indexer, &sd, &field, &mut rng).unwrap();
        let server_id = indexer.total_parties();

        for g in 1..=indexer.group_count() {
            let members = indexer.unrank(g).unwrap();
            let device_members: Vec<usize> =
                members.into_iter().filter(|&m| m != server_id).collect();
            let shares: Vec<&Vector> = device_members
                .iter()
                .map(|&m| repo.get(m, g).unwrap())
                .collect();
            let recovered = reconstruct(&device_members, &shares, &field).unwrap();
            assert_eq!(recovered, sd, "group {g} failed to reconstruct sd");
        }
    }

    #[test]
    fn outer_split_decomposes_exactly() {
        let field = field();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let secret = Vector::random(4, &field, &mut rng);
        let (sd, ss) = outer_split(&secret, &field, &mut rng);
        assert_eq!(sd.add(&ss, &field), secret);
    }

    #[test]
    fn t_equals_2_uses_the_generic_additive_rule() {
        let field = field();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let indexer = GroupIndexer::new(3, 2);
        let sd = Vector::random(2, &field, &mut rng);
        let repo = disperse(&indexer, &sd, &field, &mut rng).unwrap();
        let members = indexer.unrank(1).unwrap();
        assert_eq!(members.len(), 2);
        // The second member's share must not simply equal sd (that would be
        // the degenerate duplicate-to-all-devices scheme this design rejects).
        assert_ne!(repo.get(members[1], 1).unwrap(), &sd);
    }

    #[test]
    fn scale_party_preserves_reconstruction_after_rotation() {
        let field = field();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let indexer = GroupIndexer::new(5, 3);
        let sd = Vector::random(4, &field, &mut rng);
        let mut repo = disperse(&indexer, &sd, &field, &mut rng).unwrap();

        let scalar = field.rand(&mut rng);
        for party_id in 1..=4 {
            repo.scale_party(party_id, scalar, &field);
        }
        let rotated_sd = sd.scalar_mul(scalar, &field);
        let server_id = indexer.total_parties();

        for g in 1..=indexer.group_count() {
            let members = indexer.unrank(g).unwrap();
            let device_members: Vec<usize> =
                members.into_iter().filter(|&m| m != server_id).collect();
            let shares: Vec<&Vector> = device_members
                .iter()
                .map(|&m| repo.get(m, g).unwrap())
                .collect();
            let recovered = reconstruct(&device_members, &shares, &field).unwrap();
            assert_eq!(recovered, rotated_sd);
        }
    }
}
