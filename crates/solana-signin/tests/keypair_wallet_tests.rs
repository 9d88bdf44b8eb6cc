/*
[INPUT]:  Local keypair wallet and shared connection
[OUTPUT]: End-to-end results for sign-in, verification and rejection
[POS]:    Integration tests - keypair wallet through the sign-in operation
[UPDATE]: When wallet signing or verification flow changes
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use solana_signin::{
    Approver, KeypairWallet, SharedConnection, SignInConfig, SignInError, SignInMessage,
    SignInOperation, SolanaChain, WalletErrorCode, generate_nonce, verify_sign_in,
};
use tokio_test::{assert_err, assert_ok};

#[derive(Default)]
struct CountingDeny {
    prompts: AtomicUsize,
}

#[async_trait]
impl Approver for CountingDeny {
    async fn approve(&self, _message: &str) -> bool {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        false
    }
}

#[tokio::test]
async fn test_keypair_sign_in_end_to_end() {
    let wallet = Arc::new(KeypairWallet::from_seed(&[42u8; 32]).with_origin("app.example"));
    let connection = SharedConnection::new();
    connection.connect(wallet.clone());

    let nonce = generate_nonce();
    let config = SignInConfig::new()
        .with_domain("example.com")
        .with_statement("Sign in to Example")
        .with_chain(SolanaChain::Devnet)
        .with_nonce(nonce.clone());
    let operation = SignInOperation::new(Arc::new(connection), Some(config));

    let output = assert_ok!(operation.sign_in().await);

    assert_eq!(output.account.address, wallet.address());
    let message = assert_ok!(SignInMessage::parse(output.message_text().unwrap()));
    assert_eq!(message.domain, "example.com");
    assert_eq!(message.chain_id.as_deref(), Some("devnet"));
    assert_eq!(message.nonce.as_deref(), Some(nonce.as_str()));

    let request = operation.request_for(wallet.address());
    assert_ok!(verify_sign_in(&request, &output));
}

#[tokio::test(start_paused = true)]
async fn test_denied_prompt_is_terminal() {
    let approver = Arc::new(CountingDeny::default());
    let wallet = Arc::new(
        KeypairWallet::generate()
            .with_origin("app.example")
            .with_approver(approver.clone()),
    );
    let connection = SharedConnection::new();
    connection.connect(wallet);
    let operation = SignInOperation::new(Arc::new(connection), None);

    let err = assert_err!(operation.sign_in().await);

    assert!(matches!(err, SignInError::UserRejected { .. }));
    assert_eq!(approver.prompts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_verification_catches_other_wallet_output() {
    let wallet = Arc::new(KeypairWallet::from_seed(&[1u8; 32]).with_origin("app.example"));
    let connection = SharedConnection::new();
    connection.connect(wallet.clone());
    let operation = SignInOperation::new(Arc::new(connection), None);

    let output = assert_ok!(operation.sign_in().await);

    let other = KeypairWallet::from_seed(&[2u8; 32]);
    let request = operation.request_for(other.address());
    assert!(matches!(
        verify_sign_in(&request, &output),
        Err(SignInError::Verification(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_unbuildable_request_is_not_retried() {
    // No origin and no configured domain: the wallet cannot build the message.
    let wallet = Arc::new(KeypairWallet::generate());
    let connection = SharedConnection::new();
    connection.connect(wallet);
    let operation = SignInOperation::new(Arc::new(connection), None);

    let err = assert_err!(operation.sign_in().await);

    match err {
        SignInError::Wallet(error) => assert_eq!(error.code, Some(WalletErrorCode::InvalidParams)),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(operation.failure_count(), 1);
}
