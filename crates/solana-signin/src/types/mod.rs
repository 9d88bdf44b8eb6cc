/*
[INPUT]:  Wallet-standard sign-in schema
[OUTPUT]: Public type definitions for accounts, sign-in input and output
[POS]:    Data layer - module exports
[UPDATE]: When adding new type modules
*/

pub mod enums;
pub mod models;

pub use enums::*;
pub use models::*;
