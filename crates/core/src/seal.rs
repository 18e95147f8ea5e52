//! Authenticated storage of a known plaintext under a key derived from `rw`,
//! used as the server's pass/fail verification oracle.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::errors::ProtocolError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// The fixed known plaintext the server seals under `KDF(rw)` and later
/// unseals to confirm a reconstructed `rw'` matches.
pub const VERIFICATION_TOKEN: &[u8] = b"Hello";

const IV_LEN: usize = 16;

/// `KDF(rw) = SHA-256(LE64(rw))`, used directly as a 32-byte AES-256 key.
pub fn kdf(rw: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(rw.to_le_bytes());
    hasher.finalize().into()
}

/// A sealed verifier: an AES-256-CBC ciphertext of [`VERIFICATION_TOKEN`]
/// plus the random IV it was encrypted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedVerifier {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
}

/// Seals [`VERIFICATION_TOKEN`] under `KDF(rw)` with a freshly sampled IV.
pub fn seal<R: RngCore>(rw: u64, rng: &mut R) -> SealedVerifier {
    let key = kdf(rw);
    let mut iv = [0u8; IV_LEN];
    rng.fill_bytes(&mut iv);
    let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(VERIFICATION_TOKEN);
    SealedVerifier { ciphertext, iv }
}

/// Attempts to unseal `verifier` under `KDF(rw)`.
///
/// Returns `Ok(())` iff decryption succeeds and yields exactly
/// [`VERIFICATION_TOKEN`]; any other outcome (bad padding, wrong plaintext)
/// is reported uniformly as [`ProtocolError::VerificationMismatch`], since
/// from the caller's perspective a rounding inconsistency and a wrong
/// password are indistinguishable.
pub fn unseal(verifier: &SealedVerifier, rw: u64) -> Result<(), ProtocolError> {
    let key = kdf(rw);
    let decrypted = Aes256CbcDec::new(&key.into(), &verifier.iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&verifier.ciphertext)
        .map_err(|_| ProtocolError::VerificationMismatch)?;
    if decrypted == VERIFICATION_TOKEN {
        Ok(())
    } else {
        Err(ProtocolError::VerificationMismatch)
    }
}
