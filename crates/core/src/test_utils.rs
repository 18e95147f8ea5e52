//! Deterministic test fixtures: system parameters and a registered
//! User/Server/Device trio, for exercising the protocol without repeating
//! the same setup boilerplate in every test module.
//!
//! Gated behind `cfg(test)` or the `dev` feature, matching how the teacher
//! crate scopes its own fixture-construction helpers away from the
//! production build.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::params::SystemParams;
use crate::protocol::register;
use crate::roles::{DeviceState, ServerState, UserState};

/// The seed scenario's parameters: `n=4, T=5` (4 devices + server), `t=3`,
/// with `q = 2^31 - 1`, `q1 = 2^30`, `p = 2^16`.
pub fn seed_scenario_params() -> SystemParams {
    SystemParams::new(2_147_483_647, 1 << 30, 1 << 16, 4, 5, 3)
        .expect("seed scenario parameters are well-formed")
}

/// A deterministic CSPRNG seeded from `seed`, for reproducible fixtures.
pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Registers a fresh user/server/device trio under `pw`, using a
/// deterministic RNG seeded from `seed`.
pub fn registered_fixture(
    params: SystemParams,
    pw: &[u8],
    seed: u64,
) -> (UserState, ServerState, Vec<DeviceState>) {
    let mut rng = seeded_rng(seed);
    register(params, pw, &mut rng).expect("fixture registration should not fail")
}
