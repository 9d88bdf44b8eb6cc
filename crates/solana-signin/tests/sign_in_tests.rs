/*
[INPUT]:  Mock wallets and connection snapshots
[OUTPUT]: Test results for the sign-in operation lifecycle
[POS]:    Integration tests - sign-in operation
[UPDATE]: When sign-in semantics or retry policy change
*/

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ADDRESS, connected, sample_output, test_account};
use rstest::rstest;
use solana_signin::signin::default_options;
use solana_signin::{
    AlwaysOnline, ConnectionSnapshot, MockResponse, MockWallet, MutationOptions, OperationState,
    OperationStatus, SharedConnection, SignInConfig, SignInError, SignInOperation, WalletError,
    WalletErrorCode,
};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_not_connected_never_loads_or_calls_wallet() {
    let operation = SignInOperation::new(Arc::new(ConnectionSnapshot::disconnected()), None);
    let mut updates = operation.subscribe();

    let err = assert_err!(operation.sign_in().await);

    assert_eq!(err, SignInError::NotConnected);
    assert_eq!(operation.error(), Some(SignInError::NotConnected));
    assert!(!operation.is_loading());
    assert!(operation.output().is_none());
    assert!(updates.has_changed().unwrap());
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.state.status(), OperationStatus::Failure);
    // Rejected before submission.
    assert!(snapshot.submitted_at.is_none());
}

#[tokio::test]
async fn test_no_account_fails_without_calling_wallet() {
    let wallet = MockWallet::new(test_account());
    let connection = SharedConnection::new();
    connection.connect(Arc::new(wallet.clone()));
    connection.clear_account();

    let operation = SignInOperation::new(Arc::new(connection), None);
    let err = assert_err!(operation.sign_in().await);

    assert_eq!(err, SignInError::NoAccount);
    assert_eq!(wallet.call_count(), 0);
    assert!(!operation.is_loading());
}

#[tokio::test]
async fn test_missing_sign_in_feature() {
    let wallet = MockWallet::new(test_account()).without_sign_in();
    let operation = SignInOperation::new(connected(&wallet), None);

    let err = assert_err!(operation.sign_in().await);

    assert_eq!(
        err,
        SignInError::UnsupportedFeature {
            feature: "solana:signIn".to_string()
        }
    );
    assert_eq!(operation.failure_count(), 1);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
#[tokio::test]
async fn test_output_is_first_entry(#[case] returned: usize) {
    let outputs: Vec<_> = (0..returned)
        .map(|i| sample_output(ADDRESS, &i.to_string()))
        .collect();
    let wallet = MockWallet::new(test_account()).respond_with(MockResponse::ok(outputs.clone()));
    let operation = SignInOperation::new(connected(&wallet), None);

    let output = assert_ok!(operation.sign_in().await);

    assert_eq!(output, outputs[0]);
    assert_eq!(operation.output(), Some(outputs[0].clone()));
    assert_eq!(operation.state(), OperationState::Success(outputs[0].clone()));
}

#[tokio::test]
async fn test_request_address_always_from_account() {
    let config: SignInConfig = serde_json::from_value(serde_json::json!({
        "domain": "example.com",
        "statement": "Sign in",
        "nonce": "abcdef123",
        "address": "SomebodyElse",
    }))
    .unwrap();
    let wallet = MockWallet::new(test_account());
    let operation = SignInOperation::new(connected(&wallet), Some(config.clone()));

    assert_ok!(operation.sign_in().await);

    let calls = wallet.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].address.as_deref(), Some(ADDRESS));
    assert_eq!(calls[0].config, config);
}

#[tokio::test]
async fn test_sign_in_scenario() {
    let config = SignInConfig::new()
        .with_domain("example.com")
        .with_statement("Sign in");
    let expected = sample_output(ADDRESS, "scenario");
    let wallet =
        MockWallet::new(test_account()).respond_with(MockResponse::ok(vec![expected.clone()]));
    let operation = SignInOperation::new(connected(&wallet), Some(config));

    let output = assert_ok!(operation.sign_in().await);

    assert_eq!(output, expected);
    assert_eq!(operation.output(), Some(expected));
    assert!(operation.error().is_none());
    assert!(!operation.is_loading());

    let request = &wallet.calls()[0];
    assert_eq!(request.config.domain.as_deref(), Some("example.com"));
    assert_eq!(request.config.statement.as_deref(), Some("Sign in"));
}

#[rstest]
#[case("User rejected the request.")]
#[case("Request DENIED by user")]
#[case("transaction Rejected")]
#[tokio::test(start_paused = true)]
async fn test_rejection_is_not_retried(#[case] message: &str) {
    let wallet = MockWallet::new(test_account()).fail_always(WalletError::new(message));
    let operation = SignInOperation::new(connected(&wallet), None);

    let err = assert_err!(operation.sign_in().await);

    assert_eq!(
        err,
        SignInError::UserRejected {
            message: message.to_string()
        }
    );
    assert_eq!(wallet.call_count(), 1);
    assert_eq!(operation.error(), Some(err));
}

#[tokio::test(start_paused = true)]
async fn test_structured_rejection_code_is_not_retried() {
    let wallet = MockWallet::new(test_account())
        .fail_always(WalletError::with_code(WalletErrorCode::UserRejected, "closed"));
    let operation = SignInOperation::new(connected(&wallet), None);

    let err = assert_err!(operation.sign_in().await);

    assert!(err.is_user_rejection());
    assert_eq!(wallet.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_coded_error_with_rejection_text_is_not_retried() {
    let wallet = MockWallet::new(test_account()).fail_always(WalletError::with_code(
        WalletErrorCode::Internal,
        "Request denied by user",
    ));
    let operation = SignInOperation::new(connected(&wallet), None);

    let err = assert_err!(operation.sign_in().await);

    assert!(err.is_user_rejection());
    assert_eq!(wallet.call_count(), 1);
    assert_eq!(operation.failure_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_retry_with_backoff() {
    let wallet = MockWallet::new(test_account())
        .respond_with(MockResponse::err(WalletError::new("attempt 1")))
        .respond_with(MockResponse::err(WalletError::new("attempt 2")))
        .respond_with(MockResponse::err(WalletError::new("attempt 3")))
        .respond_with(MockResponse::err(WalletError::new("attempt 4")))
        .respond_with(MockResponse::ok(vec![sample_output(ADDRESS, "late")]));
    let handle = wallet.sign_in_handle();
    let operation = SignInOperation::new(connected(&wallet), None);

    let err = assert_err!(operation.sign_in().await);

    assert_eq!(err, SignInError::Wallet(WalletError::new("attempt 4")));
    assert_eq!(operation.error(), Some(err));
    assert_eq!(operation.failure_count(), 4);

    let instants = handle.call_instants();
    assert_eq!(instants.len(), 4);
    let gaps: Vec<Duration> = instants.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(
        gaps,
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(2000),
            Duration::from_millis(3000),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_recovers() {
    let expected = sample_output(ADDRESS, "recovered");
    let wallet = MockWallet::new(test_account())
        .respond_with(MockResponse::err(WalletError::new("RPC unavailable")))
        .respond_with(MockResponse::ok(vec![expected.clone()]));
    let operation = SignInOperation::new(connected(&wallet), None);

    let output = assert_ok!(operation.sign_in().await);

    assert_eq!(output, expected);
    assert_eq!(wallet.call_count(), 2);
    assert_eq!(operation.failure_count(), 1);
    assert!(operation.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_empty_response_is_retried_then_fails() {
    let wallet = MockWallet::new(test_account());
    wallet
        .sign_in_handle()
        .set_fallback(MockResponse::ok(Vec::new()));
    let operation = SignInOperation::new(connected(&wallet), None);

    let err = assert_err!(operation.sign_in().await);

    assert_eq!(err, SignInError::EmptyResponse);
    assert_eq!(wallet.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_pending_while_wallet_prompt_open() {
    let wallet = MockWallet::new(test_account()).respond_with(
        MockResponse::ok(vec![sample_output(ADDRESS, "slow")]).after(Duration::from_secs(30)),
    );
    let operation = SignInOperation::new(connected(&wallet), None);

    let task = {
        let operation = operation.clone();
        tokio::spawn(async move { operation.sign_in().await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(operation.is_loading());
    assert_eq!(operation.state(), OperationState::Pending);

    assert_ok!(task.await.unwrap());
    assert!(!operation.is_loading());
    assert!(operation.output().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_reinvocation_passes_through_pending() {
    let wallet = MockWallet::new(test_account())
        .respond_with(MockResponse::err(WalletError::new("denied")))
        .respond_with(
            MockResponse::ok(vec![sample_output(ADDRESS, "second")]).after(Duration::from_secs(5)),
        );
    let operation = SignInOperation::new(connected(&wallet), None);

    assert_err!(operation.sign_in().await);
    assert!(operation.error().is_some());

    let mut updates = operation.subscribe();
    let task = {
        let operation = operation.clone();
        tokio::spawn(async move { operation.sign_in().await })
    };

    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().state, OperationState::Pending);
    assert!(operation.error().is_none());

    assert_ok!(task.await.unwrap());
    assert_eq!(operation.state().status(), OperationStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_invocations_last_settled_wins() {
    let first = sample_output(ADDRESS, "first");
    let second = sample_output(ADDRESS, "second");
    let wallet = MockWallet::new(test_account())
        .respond_with(MockResponse::ok(vec![first.clone()]).after(Duration::from_secs(10)))
        .respond_with(MockResponse::ok(vec![second.clone()]).after(Duration::from_secs(1)));
    let operation = SignInOperation::new(connected(&wallet), None);

    let (a, b) = tokio::join!(operation.sign_in(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        operation.sign_in().await
    });

    assert_eq!(assert_ok!(a), first);
    assert_eq!(assert_ok!(b), second);
    // The slow first invocation settled last, so its output is what remains.
    assert_eq!(operation.output(), Some(first));
}

#[tokio::test(start_paused = true)]
async fn test_serialized_invocations_run_in_order() {
    let first = sample_output(ADDRESS, "first");
    let second = sample_output(ADDRESS, "second");
    let wallet = MockWallet::new(test_account())
        .respond_with(MockResponse::ok(vec![first.clone()]).after(Duration::from_secs(10)))
        .respond_with(MockResponse::ok(vec![second.clone()]).after(Duration::from_secs(1)));
    let handle = wallet.sign_in_handle();
    let options = default_options().serialized(true);
    let operation = SignInOperation::with_options(
        connected(&wallet),
        None,
        options,
        Arc::new(AlwaysOnline),
    );

    let (a, b) = tokio::join!(operation.sign_in(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        operation.sign_in().await
    });

    assert_eq!(assert_ok!(a), first);
    assert_eq!(assert_ok!(b), second);
    assert_eq!(operation.output(), Some(second));

    let instants = handle.call_instants();
    assert_eq!(instants[1] - instants[0], Duration::from_secs(10));
}

#[tokio::test]
async fn test_reset_returns_to_idle() {
    let wallet = MockWallet::new(test_account());
    let operation = SignInOperation::new(connected(&wallet), None);

    assert_ok!(operation.sign_in().await);
    operation.reset();

    assert_eq!(operation.state(), OperationState::Idle);
    assert!(operation.output().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_options_without_retry() {
    let wallet = MockWallet::new(test_account()).fail_always(WalletError::new("flaky"));
    let operation = SignInOperation::with_options(
        connected(&wallet),
        None,
        MutationOptions::default(),
        Arc::new(AlwaysOnline),
    );

    assert_err!(operation.sign_in().await);
    assert_eq!(wallet.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_caller_still_settles() {
    let late = sample_output(ADDRESS, "late");
    let wallet = MockWallet::new(test_account())
        .respond_with(MockResponse::ok(vec![late.clone()]).after(Duration::from_secs(30)));
    let operation = SignInOperation::new(connected(&wallet), None);

    let abandoned = tokio::time::timeout(Duration::from_secs(1), operation.sign_in()).await;
    assert!(abandoned.is_err());
    assert!(operation.is_loading());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!operation.is_loading());
    assert_eq!(operation.output(), Some(late));
    assert_eq!(wallet.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_serialized_precondition_failure_waits_for_queue() {
    let wallet = MockWallet::new(test_account()).respond_with(
        MockResponse::ok(vec![sample_output(ADDRESS, "queued")]).after(Duration::from_secs(10)),
    );
    let connection = Arc::new(SharedConnection::new());
    connection.connect(Arc::new(wallet.clone()));
    let operation = SignInOperation::with_options(
        connection.clone(),
        None,
        default_options().serialized(true),
        Arc::new(AlwaysOnline),
    );

    let first = {
        let operation = operation.clone();
        tokio::spawn(async move { operation.sign_in().await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;
    connection.disconnect();
    let second = {
        let operation = operation.clone();
        tokio::spawn(async move { operation.sign_in().await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;

    // The queued wallet prompt is still open.
    assert!(operation.is_loading());
    assert!(operation.error().is_none());

    assert_ok!(first.await.unwrap());
    assert_eq!(second.await.unwrap(), Err(SignInError::NotConnected));
    assert_eq!(operation.error(), Some(SignInError::NotConnected));
    assert_eq!(wallet.call_count(), 1);
}
