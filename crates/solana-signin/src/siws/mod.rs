/*
[INPUT]:  Sign-in inputs and signed wallet outputs
[OUTPUT]: Sign-In With Solana message text, verification, nonces
[POS]:    SIWS layer - message format shared by wallets and verifiers
[UPDATE]: When the sign-in message format changes
*/

pub mod message;
pub mod verify;

use rand::Rng;
use rand::distributions::Alphanumeric;

pub use message::SignInMessage;
pub use verify::{verify_sign_in, verify_sign_in_at};

/// Minimum nonce length accepted in a sign-in message
pub const MIN_NONCE_LEN: usize = 8;

const NONCE_LEN: usize = 16;

/// Random alphanumeric nonce
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}
