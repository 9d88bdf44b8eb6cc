/*
[INPUT]:  Test configuration and fixture requirements
[OUTPUT]: Shared test utilities, fixtures, and wiring helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for solana-signin tests

use std::sync::Arc;

use solana_signin::{ConnectionSnapshot, MockWallet, SignInOutput, WalletAccount};

pub const ADDRESS: &str = "Addr1";

pub fn test_account() -> WalletAccount {
    WalletAccount::new(ADDRESS, vec![1u8; 32])
}

/// A signed output as a wallet would return it for `address`
pub fn sample_output(address: &str, tag: &str) -> SignInOutput {
    SignInOutput {
        account: WalletAccount::new(address, vec![1u8; 32]),
        signed_message: format!("signed message {tag}").into_bytes(),
        signature: vec![2u8; 64],
        signature_type: None,
    }
}

/// Connection holding `wallet` with the default test account selected
pub fn connected(wallet: &MockWallet) -> Arc<ConnectionSnapshot> {
    Arc::new(ConnectionSnapshot::connected(
        Arc::new(wallet.clone()),
        test_account(),
    ))
}
