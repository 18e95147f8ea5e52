//! Wire message schema for the three-party protocol (User, Server, Device).
//!
//! These types model the normative `kind`-tagged payloads of the system
//! design's External Interfaces section. The actual socket transport,
//! newline framing, and JSON encoding/decoding are out of scope for this
//! crate (see `spec.md` §1/§6); these types exist so a transport layer can
//! serialize them with `serde_json` (or any other `serde` format) without
//! this crate taking on a transport or I/O dependency itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An index-keyed vector, matching the `index -> uint` map encoding the
/// system design's wire tables use for `Ss`, `SDi`, `alpha`, `cipher`, and
/// `iv` fields (`BTreeMap` keeps keys ordered for deterministic encoding).
pub type IndexMap = BTreeMap<usize, u64>;

pub fn vector_to_index_map(values: &[u64]) -> IndexMap {
    values.iter().copied().enumerate().collect()
}

pub fn index_map_to_vector(map: &IndexMap, n: usize) -> Option<Vec<u64>> {
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        out.push(*map.get(&i)?);
    }
    Some(out)
}

/// User -> Server: registers system parameters and the server's outer share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterServer {
    pub n_vector: usize,
    pub n_devices: usize,
    pub t: usize,
    #[serde(rename = "Ss")]
    pub ss: IndexMap,
}

/// User -> Device: registers system parameters and the device's inner shares
/// (one per group the device belongs to).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDevice {
    pub device_id: usize,
    pub n_vector: usize,
    pub t: usize,
    #[serde(rename = "SDi")]
    pub sdi: BTreeMap<usize, IndexMap>,
}

/// User -> Server: stores the sealed verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreCipher {
    pub cipher: IndexMap,
    pub iv: IndexMap,
}

/// User -> Peer (Server or Device): requests a partial evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub session2: String,
    pub alpha: IndexMap,
}

/// Peer -> User: a partial evaluation, or an error describing why one could
/// not be produced (e.g. the device has been revoked).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationResponse {
    Beta { beta: u64 },
    Error { error: String },
}

/// User -> Server: requests full threshold verification against a chosen
/// device group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerVerification {
    pub pw: String,
    pub session2: String,
    pub expected_rw: u64,
    pub chosen_devices: Vec<usize>,
}

/// Server -> User: the pass/fail outcome of a verification round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verification_ok: bool,
}

/// User -> Server: revokes devices and rotates the master secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeDevices {
    pub session1: String,
    pub revoked_devices: Vec<usize>,
}

/// Server -> Device: the rotation scalar (or the revocation sentinel).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyUpdate {
    pub session1: String,
}

/// Server -> User: current membership status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub n_devices: usize,
    pub t: usize,
    pub active_devices: Vec<usize>,
    pub revoked_devices: Vec<usize>,
}

/// The discriminated union of every normative wire message `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Message {
    #[serde(rename = "register_server")]
    RegisterServer(RegisterServer),
    #[serde(rename = "register_device")]
    RegisterDevice(RegisterDevice),
    #[serde(rename = "store_cipher")]
    StoreCipher(StoreCipher),
    #[serde(rename = "verification_request")]
    VerificationRequest(VerificationRequest),
    #[serde(rename = "verification_response")]
    VerificationResponse(VerificationResponse),
    #[serde(rename = "server_verification")]
    ServerVerification(ServerVerification),
    #[serde(rename = "verification_result")]
    VerificationResult(VerificationResult),
    #[serde(rename = "revoke_devices")]
    RevokeDevices(RevokeDevices),
    #[serde(rename = "key_update")]
    KeyUpdate(KeyUpdate),
    #[serde(rename = "send_updated_share")]
    SendUpdatedShare,
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "status_response")]
    StatusResponse(StatusResponse),
}
