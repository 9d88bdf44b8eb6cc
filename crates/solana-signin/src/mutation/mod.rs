/*
[INPUT]:  Async task closures, retry policy and connectivity source
[OUTPUT]: Tracked mutation state (pending / error / data) and final results
[POS]:    Mutation layer - generic async operation tracker
[UPDATE]: When retry, network or state semantics change
*/

pub mod network;
pub mod retry;
pub mod runner;
pub mod state;

pub use network::{AlwaysOnline, Connectivity, NetworkMode, OnlineStatus};
pub use retry::{RetryPolicy, Retryable};
pub use runner::{Mutation, MutationKey, MutationOptions};
pub use state::{MutationSnapshot, OperationState, OperationStatus};
