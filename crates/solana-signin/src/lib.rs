/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public solana-signin crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod config;
pub mod error;
pub mod mutation;
pub mod signin;
pub mod siws;
pub mod types;
pub mod wallet;

pub use config::{RetryConfig, SignInSettings};

pub use error::{Result, SignInError, WalletError, WalletErrorCode};

// Re-export commonly used types from mutation
pub use mutation::{
    AlwaysOnline,
    Connectivity,
    Mutation,
    MutationKey,
    MutationOptions,
    MutationSnapshot,
    NetworkMode,
    OnlineStatus,
    OperationState,
    OperationStatus,
    RetryPolicy,
};

pub use signin::SignInOperation;

pub use siws::{SignInMessage, generate_nonce, verify_sign_in};

// Re-export all types
pub use types::*;

// Re-export commonly used types from wallet
pub use wallet::{
    Approver,
    ConnectionSnapshot,
    KeypairWallet,
    MockResponse,
    MockWallet,
    SharedConnection,
    Wallet,
    WalletConnection,
};
