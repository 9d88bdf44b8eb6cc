/*
[INPUT]:  Wallet connection provider and optional sign-in config
[OUTPUT]: SignInOperation with error / loading / output view and trigger
[POS]:    Sign-in layer - public entry point
[UPDATE]: When the sign-in operation surface changes
*/

pub mod operation;

pub use operation::{CLIENT_KEY, SignInOperation, default_options, sign_in_mutation_key};
