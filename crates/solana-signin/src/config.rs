/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed sign-in settings and mutation options
[POS]:    Configuration layer - operation setup
[UPDATE]: When adding new configuration options
*/

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignInError};
use crate::mutation::{MutationKey, MutationOptions, NetworkMode, RetryPolicy};
use crate::signin::CLIENT_KEY;
use crate::siws::MIN_NONCE_LEN;
use crate::types::SignInConfig;

/// Top-level configuration for a sign-in operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SignInSettings {
    /// Key identifying the operation in logs
    #[serde(default = "default_mutation_key")]
    pub mutation_key: Vec<String>,
    /// "online", "always" or "offlineFirst"
    #[serde(default = "default_network_mode")]
    pub network_mode: NetworkMode,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Queue concurrent invocations instead of racing them
    #[serde(default)]
    pub serialized: bool,
    /// Parameters passed through to the wallet
    #[serde(default)]
    pub sign_in: SignInConfig,
}

/// Retry parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for SignInSettings {
    fn default() -> Self {
        Self {
            mutation_key: default_mutation_key(),
            network_mode: default_network_mode(),
            retry: RetryConfig::default(),
            serialized: false,
            sign_in: SignInConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

fn default_mutation_key() -> Vec<String> {
    vec![CLIENT_KEY.to_string(), "signIn".to_string()]
}

fn default_network_mode() -> NetworkMode {
    NetworkMode::OfflineFirst
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    3000
}

impl SignInSettings {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SignInError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(content)
            .map_err(|e| SignInError::Config(format!("Invalid sign-in settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mutation_key.is_empty() {
            return Err(SignInError::Config("mutation_key must not be empty".to_string()));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(SignInError::Config(format!(
                "retry.max_delay_ms ({}) must be >= retry.base_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.base_delay_ms
            )));
        }
        if let Some(nonce) = &self.sign_in.nonce
            && (nonce.len() < MIN_NONCE_LEN || !nonce.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(SignInError::Config(format!(
                "sign_in.nonce must be at least {MIN_NONCE_LEN} alphanumeric characters"
            )));
        }
        Ok(())
    }

    pub fn mutation_options(&self) -> MutationOptions {
        MutationOptions::default()
            .with_key(MutationKey::new(self.mutation_key.iter().cloned()))
            .network_mode(self.network_mode)
            .retry(self.retry.policy())
            .serialized(self.serialized)
    }
}
