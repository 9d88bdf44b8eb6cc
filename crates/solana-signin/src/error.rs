/*
[INPUT]:  Failures from connection lookup, wallet features, verification, config
[OUTPUT]: Structured error types with retry and rejection classification
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or wallet error codes
*/

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mutation::Retryable;

/// Structured failure codes a wallet can attach to an error.
///
/// Numeric values follow the provider error codes wallets already use
/// (EIP-1193 style), so adapters can map them without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletErrorCode {
    /// The user declined the prompt
    UserRejected,
    /// The account or method is not authorized for this origin
    Unauthorized,
    /// The wallet does not support the requested method
    UnsupportedMethod,
    /// The wallet lost its connection
    Disconnected,
    /// The request itself is malformed; resending it cannot succeed
    InvalidParams,
    /// Any other wallet-internal failure
    Internal,
}

impl WalletErrorCode {
    /// Map a numeric provider code to a known variant
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            4001 => Some(Self::UserRejected),
            4100 => Some(Self::Unauthorized),
            4200 => Some(Self::UnsupportedMethod),
            4900 => Some(Self::Disconnected),
            -32602 => Some(Self::InvalidParams),
            -32603 => Some(Self::Internal),
            _ => None,
        }
    }

    /// Numeric provider code for this variant
    pub fn code(self) -> i64 {
        match self {
            Self::UserRejected => 4001,
            Self::Unauthorized => 4100,
            Self::UnsupportedMethod => 4200,
            Self::Disconnected => 4900,
            Self::InvalidParams => -32602,
            Self::Internal => -32603,
        }
    }
}

/// Error raised by a wallet feature implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct WalletError {
    pub code: Option<WalletErrorCode>,
    pub message: String,
}

impl WalletError {
    /// Error without a structured code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Error carrying a structured code
    pub fn with_code(code: WalletErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// The user declined the request
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::with_code(WalletErrorCode::UserRejected, message)
    }

    /// Whether the user explicitly rejected or denied the request.
    ///
    /// Either the structured code says so, or the message mentions a denial
    /// or rejection ([`message_indicates_rejection`]), whatever the code.
    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(WalletErrorCode::UserRejected)
            || message_indicates_rejection(&self.message)
    }

    /// Whether resending the same request could succeed
    pub fn is_transient(&self) -> bool {
        self.code != Some(WalletErrorCode::InvalidParams)
    }
}

/// Case-insensitive check for "denied" or "rejected" in a wallet message
pub fn message_indicates_rejection(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("denied") || message.contains("rejected")
}

/// Main error type for the sign-in crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignInError {
    /// No wallet session
    #[error("Wallet not connected")]
    NotConnected,

    /// Wallet connected but no account selected
    #[error("No account found")]
    NoAccount,

    /// Wallet lacks the requested feature
    #[error("Wallet does not implement the {feature} feature")]
    UnsupportedFeature { feature: String },

    /// User rejected or denied the request in the wallet
    #[error("User rejected the request: {message}")]
    UserRejected { message: String },

    /// Any other failure reported by the wallet
    #[error("Wallet error: {0}")]
    Wallet(WalletError),

    /// Wallet resolved without any sign-in result
    #[error("Wallet returned no sign-in results")]
    EmptyResponse,

    /// Signed output does not match the request or its signature is invalid
    #[error("Sign-in verification failed: {0}")]
    Verification(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<WalletError> for SignInError {
    fn from(error: WalletError) -> Self {
        if error.is_user_rejection() {
            SignInError::UserRejected {
                message: error.message,
            }
        } else {
            SignInError::Wallet(error)
        }
    }
}

impl SignInError {
    /// Check if the error is worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            SignInError::Wallet(error) => error.is_transient(),
            SignInError::EmptyResponse => true,
            _ => false,
        }
    }

    /// Check if the user declined the request
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, SignInError::UserRejected { .. })
    }

    /// Check if the error comes from a missing wallet session or account
    pub fn is_connection_error(&self) -> bool {
        matches!(self, SignInError::NotConnected | SignInError::NoAccount)
    }
}

impl Retryable for SignInError {
    fn is_retryable(&self) -> bool {
        SignInError::is_retryable(self)
    }

    fn is_user_rejection(&self) -> bool {
        SignInError::is_user_rejection(self)
    }
}

/// Result type alias for sign-in operations
pub type Result<T> = std::result::Result<T, SignInError>;
