//! Rejoin token generation.

use rand::Rng;
use streammate_protocol::RejoinToken;

/// Generates a random 32-character hex token (128 bits of entropy).
///
/// Guessing a live token is infeasible, which is what makes the token,
/// not the display name, the proof of identity on reconnect.
pub(crate) fn generate_rejoin_token() -> RejoinToken {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    RejoinToken::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
}
