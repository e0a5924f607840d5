//! RNG seed derivation for deterministic sessions.
//!
//! A process-wide base seed (see `config::engine`) is mixed with each session
//! id so that sessions get distinct but reproducible card orders.

use crate::domain::cards_types::SessionId;

/// Derive the RNG seed for one session from a base seed.
///
/// Same base + same session id = same seed. The session id contributes both
/// of its 64-bit halves so ids differing only in their tail still diverge.
pub fn derive_session_seed(base: u64, session_id: SessionId) -> u64 {
    let (hi, lo) = session_id.as_u64_pair();
    base.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(hi)
        .rotate_left(29)
        ^ lo
}
