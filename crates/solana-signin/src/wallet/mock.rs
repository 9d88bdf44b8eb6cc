/*
[INPUT]:  Scripted sign-in responses
[OUTPUT]: Deterministic wallet for tests, recording every request
[POS]:    Wallet layer - mock wallet implementation
[UPDATE]: When tests need new scripted behaviors
*/

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::WalletError;
use crate::types::{SignInInput, SignInOutput, WalletAccount};

use super::{Feature, FeatureMap, STANDARD_CONNECT, SignInFeature, Wallet};

/// One scripted answer to a sign-in request
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub delay: Duration,
    pub result: Result<Vec<SignInOutput>, WalletError>,
}

impl MockResponse {
    pub fn ok(outputs: Vec<SignInOutput>) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(outputs),
        }
    }

    pub fn err(error: WalletError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    /// Resolve only after `delay` (simulates a slow user prompt)
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Mock `solana:signIn` feature
#[derive(Debug)]
pub struct MockSignIn {
    account: Option<WalletAccount>,
    script: Mutex<VecDeque<MockResponse>>,
    fallback: Mutex<Option<MockResponse>>,
    calls: Mutex<Vec<(Instant, SignInInput)>>,
}

impl MockSignIn {
    fn new(account: Option<WalletAccount>) -> Self {
        Self {
            account,
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, response: MockResponse) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Answer used once the script is exhausted
    pub fn set_fallback(&self, response: MockResponse) {
        *self.fallback.lock().unwrap_or_else(PoisonError::into_inner) = Some(response);
    }

    pub fn calls(&self) -> Vec<SignInInput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, input)| input.clone())
            .collect()
    }

    /// Instants at which each request arrived (tokio clock)
    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn next_response(&self, input: &SignInInput) -> MockResponse {
        if let Some(response) = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        {
            return response;
        }
        if let Some(response) = self
            .fallback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return response;
        }
        MockResponse::ok(vec![self.echo_output(input)])
    }

    fn echo_output(&self, input: &SignInInput) -> SignInOutput {
        let mut account = self
            .account
            .clone()
            .unwrap_or_else(|| WalletAccount::new("", Vec::new()));
        if let Some(address) = &input.address {
            account.address.clone_from(address);
        }
        SignInOutput {
            signed_message: format!("mock sign-in for {}", account.address).into_bytes(),
            signature: vec![0; 64],
            signature_type: Some("ed25519".to_string()),
            account,
        }
    }
}

#[async_trait]
impl SignInFeature for MockSignIn {
    async fn sign_in(&self, input: SignInInput) -> Result<Vec<SignInOutput>, WalletError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((Instant::now(), input.clone()));

        let response = self.next_response(&input);
        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }
        response.result
    }
}

/// Mock wallet for testing
#[derive(Debug, Clone)]
pub struct MockWallet {
    name: String,
    accounts: Vec<WalletAccount>,
    features: FeatureMap,
    sign_in: Arc<MockSignIn>,
}

impl MockWallet {
    /// Wallet with one account and a working `solana:signIn`
    pub fn new(account: WalletAccount) -> Self {
        Self::with_accounts(vec![account])
    }

    pub fn with_accounts(accounts: Vec<WalletAccount>) -> Self {
        let sign_in = Arc::new(MockSignIn::new(accounts.first().cloned()));
        let features = FeatureMap::new()
            .with(STANDARD_CONNECT, Feature::Opaque)
            .with_sign_in(sign_in.clone());
        Self {
            name: "Mock Wallet".to_string(),
            accounts,
            features,
            sign_in,
        }
    }

    /// Drop the `solana:signIn` feature
    pub fn without_sign_in(mut self) -> Self {
        self.features = FeatureMap::new().with(STANDARD_CONNECT, Feature::Opaque);
        self
    }

    pub fn respond_with(self, response: MockResponse) -> Self {
        self.sign_in.push(response);
        self
    }

    pub fn fail_always(self, error: WalletError) -> Self {
        self.sign_in.set_fallback(MockResponse::err(error));
        self
    }

    /// Shared handle to the recorded requests
    pub fn sign_in_handle(&self) -> Arc<MockSignIn> {
        self.sign_in.clone()
    }

    pub fn call_count(&self) -> usize {
        self.sign_in.call_count()
    }

    pub fn calls(&self) -> Vec<SignInInput> {
        self.sign_in.calls()
    }
}

impl Wallet for MockWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn accounts(&self) -> Vec<WalletAccount> {
        self.accounts.clone()
    }

    fn features(&self) -> &FeatureMap {
        &self.features
    }
}
