//! Field arithmetic, two-stage LWR rounding, and hashing into `F_q`.

use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::errors::ProtocolError;

/// Modular arithmetic context over `F_q`.
///
/// `q` is a runtime value fixed once per [`crate::params::SystemParams`],
/// not a compile-time constant, so every operation here takes `&self`
/// rather than relying on a process-wide global modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    q: u64,
}

impl Field {
    pub fn new(q: u64) -> Self {
        Self { q }
    }

    pub fn modulus(&self) -> u64 {
        self.q
    }

    /// Canonical representative of `x` in `[0, q)`.
    pub fn reduce(&self, x: u64) -> u64 {
        x % self.q
    }

    pub fn add(&self, a: u64, b: u64) -> u64 {
        ((a as u128 + b as u128) % self.q as u128) as u64
    }

    pub fn sub(&self, a: u64, b: u64) -> u64 {
        let q = self.q as u128;
        ((a as u128 + q - (b as u128 % q)) % q) as u64
    }

    pub fn mul(&self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % self.q as u128) as u64
    }

    /// Multiplicative inverse of `a` in `F_q`, via Fermat's little theorem.
    ///
    /// Requires `q` prime and `a != 0`; every modulus used by the system
    /// design's seed scenarios (e.g. `q = 2^31 - 1`) satisfies this.
    pub fn inv(&self, a: u64) -> Result<u64, ProtocolError> {
        if a % self.q == 0 {
            return Err(ProtocolError::InvalidParameter);
        }
        Ok(self.pow(a, self.q - 2))
    }

    fn pow(&self, base: u64, mut exp: u64) -> u64 {
        let mut result: u128 = 1;
        let mut b = (base as u128) % (self.q as u128);
        let q = self.q as u128;
        while exp > 0 {
            if exp & 1 == 1 {
                result = (result * b) % q;
            }
            b = (b * b) % q;
            exp >>= 1;
        }
        result as u64
    }

    /// Divides `a` by `b` in the field: `a * b^-1`.
    pub fn div(&self, a: u64, b: u64) -> Result<u64, ProtocolError> {
        Ok(self.mul(a, self.inv(b)?))
    }

    /// Samples a uniformly random field element.
    pub fn rand<R: RngCore>(&self, rng: &mut R) -> u64 {
        // Rejection sampling over 8-byte draws keeps the distribution exactly
        // uniform on [0, q) rather than introducing modulo bias.
        let ceiling = u64::MAX - (u64::MAX % self.q);
        loop {
            let draw = rng.next_u64();
            if draw < ceiling {
                return draw % self.q;
            }
        }
    }
}

/// An element of `F_q^n`: an ordered sequence of exactly `n` canonical reps.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize)]
pub struct Vector(Vec<u64>);

impl Vector {
    pub fn from_raw(values: Vec<u64>) -> Self {
        Self(values)
    }

    pub fn zero(n: usize) -> Self {
        Self(vec![0; n])
    }

    pub fn random<R: RngCore>(n: usize, field: &Field, rng: &mut R) -> Self {
        Self((0..n).map(|_| field.rand(rng)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn add(&self, other: &Self, field: &Field) -> Self {
        debug_assert_eq!(self.len(), other.len());
        Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| field.add(*a, *b))
                .collect(),
        )
    }

    pub fn sub(&self, other: &Self, field: &Field) -> Self {
        debug_assert_eq!(self.len(), other.len());
        Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| field.sub(*a, *b))
                .collect(),
        )
    }

    pub fn scalar_mul(&self, scalar: u64, field: &Field) -> Self {
        Self(self.0.iter().map(|a| field.mul(*a, scalar)).collect())
    }

    pub fn inner_product(&self, other: &Self, field: &Field) -> u64 {
        debug_assert_eq!(self.len(), other.len());
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u64, |acc, (a, b)| field.add(acc, field.mul(*a, *b)))
    }
}

/// Two-stage LWR rounding: `⌊(x · m_out + m_in/2) / m_in⌋ mod m_out`.
///
/// This is the integer-division formula the system design declares
/// normative (round-half-up scale-and-round-to-nearest); any bit-shift based
/// implementation must match it bit-for-bit, which is why this
/// implementation does not bother with one.
pub fn round_to(x: u64, m_in: u64, m_out: u64) -> Result<u64, ProtocolError> {
    if m_out > m_in || m_in == 0 || m_out == 0 {
        return Err(ProtocolError::InvalidParameter);
    }
    let numerator = (x as u128) * (m_out as u128) + (m_in as u128) / 2;
    Ok(((numerator / m_in as u128) % m_out as u128) as u64)
}

/// Hashes an arbitrary byte string into a single `F_q` scalar.
///
/// Used for `H(session1)`, `H(session2)`, and as the scalar divisor when
/// constructing the blinding element `alpha` — per the system design, the
/// session-scalar hash is always a scalar broadcast, never per-component.
pub fn hash_scalar(bytes: &[u8], field: &Field) -> u64 {
    let digest = Sha256::digest(bytes);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    field.reduce(u64::from_le_bytes(buf))
}

/// Hashes an arbitrary byte string into a vector in `F_q^n`, one independent
/// scalar hash per component (domain-separated by component index).
///
/// This is `H(pw)` as used by the direct PRF evaluation and as the vector
/// that `alpha` is derived from.
pub fn hash_to_vector(bytes: &[u8], n: usize, field: &Field) -> Vector {
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let mut input = Vec::with_capacity(bytes.len() + 1 + 10);
        input.extend_from_slice(bytes);
        input.push(b':');
        input.extend_from_slice(i.to_string().as_bytes());
        out.push(hash_scalar(&input, field));
    }
    Vector(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn rounding_identity_holds() {
        assert_eq!(round_to(41, 100, 100).unwrap(), 41);
        assert_eq!(round_to(99, 100, 1).unwrap(), 1);
    }

    #[test]
    fn rounding_rejects_inverted_moduli() {
        assert!(round_to(5, 10, 20).is_err());
    }

    #[test]
    fn field_inverse_round_trips() {
        let field = Field::new(2147483647);
        let a = 123456789u64;
        let inv = field.inv(a).unwrap();
        assert_eq!(field.mul(a, inv), 1);
    }

    #[test]
    fn secret_decomposition_identity() {
        let field = Field::new(2147483647);
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let s = Vector::random(4, &field, &mut rng);
        let sd = Vector::random(4, &field, &mut rng);
        let ss = s.sub(&sd, &field);
        assert_eq!(sd.add(&ss, &field), s);
    }

    #[test]
    fn hash_to_vector_is_deterministic_and_component_separated() {
        let field = Field::new(2147483647);
        let a = hash_to_vector(b"hunter2", 4, &field);
        let b = hash_to_vector(b"hunter2", 4, &field);
        assert_eq!(a, b);
        // Components must differ from each other (domain separation by index).
        assert_ne!(a.as_slice()[0], a.as_slice()[1]);
    }

    #[test]
    fn inner_product_matches_naive_sum() {
        let field = Field::new(97);
        let x = Vector::from_raw(vec![3, 5, 7]);
        let y = Vector::from_raw(vec![11, 13, 17]);
        let expected = (3 * 11 + 5 * 13 + 7 * 17) % 97;
        assert_eq!(x.inner_product(&y, &field), expected);
    }
}
