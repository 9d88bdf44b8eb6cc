/*
[INPUT]:  Wallet selection events from the host application
[OUTPUT]: Point-in-time {wallet, account} snapshots
[POS]:    Wallet layer - connection provider
[UPDATE]: When connection lifecycle or account selection rules change
*/

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{Result, SignInError};
use crate::types::WalletAccount;

use super::Wallet;

/// Connected wallet and selected account at one point in time
#[derive(Clone, Default)]
pub struct ConnectionSnapshot {
    pub wallet: Option<Arc<dyn Wallet>>,
    pub account: Option<WalletAccount>,
}

impl fmt::Debug for ConnectionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSnapshot")
            .field("wallet", &self.wallet.as_ref().map(|wallet| wallet.name()))
            .field("account", &self.account.as_ref().map(|account| &account.address))
            .finish()
    }
}

impl ConnectionSnapshot {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(wallet: Arc<dyn Wallet>, account: WalletAccount) -> Self {
        Self {
            wallet: Some(wallet),
            account: Some(account),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.wallet.is_some() && self.account.is_some()
    }
}

/// Provides the currently connected wallet and account
pub trait WalletConnection: Send + Sync {
    fn current(&self) -> ConnectionSnapshot;
}

impl WalletConnection for ConnectionSnapshot {
    fn current(&self) -> ConnectionSnapshot {
        self.clone()
    }
}

/// Thread-safe connection state, shared by clones
#[derive(Debug, Clone, Default)]
pub struct SharedConnection {
    inner: Arc<RwLock<ConnectionSnapshot>>,
}

impl SharedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect `wallet` and select its first account, if any
    pub fn connect(&self, wallet: Arc<dyn Wallet>) {
        let account = wallet.accounts().into_iter().next();
        debug!(
            wallet = wallet.name(),
            account = account.as_ref().map(|account| account.address.as_str()),
            "wallet connected"
        );
        self.replace(ConnectionSnapshot {
            wallet: Some(wallet),
            account,
        });
    }

    /// Select one of the connected wallet's accounts by address
    pub fn select_account(&self, address: &str) -> Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let wallet = guard.wallet.as_ref().ok_or(SignInError::NotConnected)?;
        let account = wallet
            .accounts()
            .into_iter()
            .find(|account| account.address == address)
            .ok_or(SignInError::NoAccount)?;
        guard.account = Some(account);
        Ok(())
    }

    /// Keep the wallet but clear the selected account
    pub fn clear_account(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.account = None;
    }

    pub fn disconnect(&self) {
        debug!("wallet disconnected");
        self.replace(ConnectionSnapshot::disconnected());
    }

    fn replace(&self, snapshot: ConnectionSnapshot) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }
}

impl WalletConnection for SharedConnection {
    fn current(&self) -> ConnectionSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
