/*
[INPUT]:  Connected wallets and their advertised features
[OUTPUT]: Capability lookup, connection snapshots, reference wallets
[POS]:    Wallet layer - wallet-standard integration abstraction
[UPDATE]: When adding new wallet features or wallet implementations
*/

pub mod connection;
pub mod features;
pub mod keypair;
pub mod mock;

pub use connection::{ConnectionSnapshot, SharedConnection, WalletConnection};
pub use features::{
    Feature, FeatureMap, SOLANA_SIGN_IN, SOLANA_SIGN_MESSAGE, STANDARD_CONNECT,
    STANDARD_DISCONNECT, SignInFeature, SignMessageFeature, SignedMessage, Wallet,
    get_wallet_feature, sign_in_feature, sign_message_feature,
};
pub use keypair::{Approver, AutoApprove, KeypairWallet};
pub use mock::{MockResponse, MockSignIn, MockWallet};
