/*
[INPUT]:  Connectivity signal from the host environment
[OUTPUT]: Start/retry gating per network mode
[POS]:    Mutation layer - network availability policy
[UPDATE]: When adding network modes or connectivity sources
*/

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// When a mutation may run relative to connectivity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkMode {
    /// Every attempt waits until online
    #[default]
    Online,
    /// Connectivity is ignored
    Always,
    /// The first attempt runs immediately; retries wait until online
    OfflineFirst,
}

impl NetworkMode {
    pub fn can_start(self, online: bool) -> bool {
        match self {
            NetworkMode::Online => online,
            NetworkMode::Always | NetworkMode::OfflineFirst => true,
        }
    }

    pub fn can_retry(self, online: bool) -> bool {
        match self {
            NetworkMode::Always => true,
            NetworkMode::Online | NetworkMode::OfflineFirst => online,
        }
    }
}

/// Source of online/offline status
#[async_trait]
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;

    /// Resolve once the environment reports it is online
    async fn wait_until_online(&self);
}

/// Connectivity source that is never offline
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

#[async_trait]
impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }

    async fn wait_until_online(&self) {}
}

/// Toggleable connectivity flag, shared by clones
#[derive(Debug, Clone)]
pub struct OnlineStatus {
    online: Arc<watch::Sender<bool>>,
}

impl OnlineStatus {
    pub fn new(online: bool) -> Self {
        let (online, _) = watch::channel(online);
        Self {
            online: Arc::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.send_replace(online);
    }
}

impl Default for OnlineStatus {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Connectivity for OnlineStatus {
    fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    async fn wait_until_online(&self) {
        let mut receiver = self.online.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = receiver.wait_for(|online| *online).await;
    }
}
