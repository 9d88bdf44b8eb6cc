/*
[INPUT]:  Per-invocation task closure, mutation options, connectivity
[OUTPUT]: Final task result plus observable MutationSnapshot updates
[POS]:    Mutation layer - executes attempts, backoff and state publication
[UPDATE]: When attempt loop, pausing or concurrency semantics change
*/

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    AlwaysOnline, Connectivity, MutationSnapshot, NetworkMode, OperationState, RetryPolicy,
    Retryable,
};

/// Hierarchical identifier used to tag a mutation in logs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MutationKey(Vec<String>);

impl MutationKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[derive(Debug, Clone)]
pub struct MutationOptions {
    pub key: Option<MutationKey>,
    pub network_mode: NetworkMode,
    pub retry: RetryPolicy,
    /// Queue invocations instead of letting them race
    pub serialized: bool,
}

/// Online, unkeyed, no retries
impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            key: None,
            network_mode: NetworkMode::default(),
            retry: RetryPolicy::none(),
            serialized: false,
        }
    }
}

impl MutationOptions {
    pub fn with_key(mut self, key: MutationKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn network_mode(mut self, network_mode: NetworkMode) -> Self {
        self.network_mode = network_mode;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn serialized(mut self, serialized: bool) -> Self {
        self.serialized = serialized;
        self
    }
}

/// Tracks pending / error / data for an async side-effecting operation.
///
/// Unless [`MutationOptions::serialized`] is set, overlapping invocations are
/// not queued: each publishes its own outcome and the snapshot reflects the one
/// that settled last.
pub struct Mutation<T, E> {
    options: MutationOptions,
    connectivity: Arc<dyn Connectivity>,
    state: watch::Sender<MutationSnapshot<T, E>>,
    queue: Mutex<()>,
}

impl<T, E> fmt::Debug for Mutation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T, E> Mutation<T, E>
where
    T: Clone,
    E: Retryable + fmt::Display + Clone,
{
    /// Create a mutation that treats the environment as always online
    pub fn new(options: MutationOptions) -> Self {
        Self::with_connectivity(options, Arc::new(AlwaysOnline))
    }

    pub fn with_connectivity(options: MutationOptions, connectivity: Arc<dyn Connectivity>) -> Self {
        let (state, _) = watch::channel(MutationSnapshot::default());
        Self {
            options,
            connectivity,
            state,
            queue: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &MutationOptions {
        &self.options
    }

    /// Run `task` until it succeeds or the retry policy gives up.
    ///
    /// `task` is called once per attempt.
    pub async fn mutate<F, Fut>(&self, task: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _queued = if self.options.serialized {
            Some(self.queue.lock().await)
        } else {
            None
        };

        let mutation_id = Uuid::new_v4();
        let key = self.key_label();
        self.state.send_replace(MutationSnapshot::submitted(Utc::now()));

        if !self
            .options
            .network_mode
            .can_start(self.connectivity.is_online())
        {
            self.pause_until_online(&key, mutation_id).await;
        }

        let mut failure_count = 0u32;
        loop {
            debug!(%key, %mutation_id, attempt = failure_count + 1, "running mutation attempt");

            let error = match task().await {
                Ok(data) => {
                    info!(%key, %mutation_id, failure_count, "mutation succeeded");
                    self.state.send_modify(|snapshot| {
                        snapshot.state = OperationState::Success(data.clone());
                        snapshot.is_paused = false;
                    });
                    return Ok(data);
                }
                Err(error) => error,
            };

            if !self.options.retry.should_retry(failure_count, &error) {
                warn!(%key, %mutation_id, %error, attempts = failure_count + 1, "mutation failed");
                self.state.send_modify(|snapshot| {
                    snapshot.state = OperationState::Failure(error.clone());
                    snapshot.failure_count = failure_count + 1;
                    snapshot.failure_reason = Some(error.clone());
                    snapshot.is_paused = false;
                });
                return Err(error);
            }

            let delay = self.options.retry.delay(failure_count);
            failure_count += 1;
            warn!(
                %key,
                %mutation_id,
                %error,
                failure_count,
                delay_ms = delay.as_millis() as u64,
                "mutation attempt failed; retrying"
            );
            self.state.send_modify(|snapshot| {
                snapshot.failure_count = failure_count;
                snapshot.failure_reason = Some(error);
            });

            tokio::time::sleep(delay).await;

            if !self
                .options
                .network_mode
                .can_retry(self.connectivity.is_online())
            {
                self.pause_until_online(&key, mutation_id).await;
            }
        }
    }

    /// Settle a precondition failure without passing through pending.
    ///
    /// Serialized mutations wait for queued invocations first.
    pub async fn reject(&self, error: E) -> E {
        let _queued = if self.options.serialized {
            Some(self.queue.lock().await)
        } else {
            None
        };
        debug!(key = %self.key_label(), %error, "mutation rejected before start");
        self.state.send_replace(MutationSnapshot {
            state: OperationState::Failure(error.clone()),
            failure_count: 1,
            failure_reason: Some(error.clone()),
            ..MutationSnapshot::default()
        });
        error
    }

    /// Return to idle, dropping data and error
    pub fn reset(&self) {
        self.state.send_replace(MutationSnapshot::default());
    }

    pub fn snapshot(&self) -> MutationSnapshot<T, E> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<MutationSnapshot<T, E>> {
        self.state.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().state.is_pending()
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().state.data().cloned()
    }

    pub fn error(&self) -> Option<E> {
        self.state.borrow().state.error().cloned()
    }

    async fn pause_until_online(&self, key: &str, mutation_id: Uuid) {
        info!(%key, %mutation_id, "offline; pausing mutation until connectivity returns");
        self.state.send_modify(|snapshot| snapshot.is_paused = true);
        self.connectivity.wait_until_online().await;
        self.state.send_modify(|snapshot| snapshot.is_paused = false);
        debug!(%key, %mutation_id, "connectivity restored; resuming mutation");
    }

    fn key_label(&self) -> String {
        self.options
            .key
            .as_ref()
            .map_or_else(|| "anonymous".to_string(), ToString::to_string)
    }
}

/// Invocations that keep running after their caller goes away
impl<T, E> Mutation<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Retryable + fmt::Display + Clone + Send + Sync + 'static,
{
    /// Like [`Mutation::mutate`], but the attempts run on a spawned task.
    ///
    /// Dropping the returned future only discards the result; the attempts
    /// continue and the snapshot still settles.
    pub async fn mutate_detached<F, Fut>(self: &Arc<Self>, task: F) -> Result<T, E>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let mutation = Arc::clone(self);
        let handle = tokio::spawn(async move { mutation.mutate(task).await });
        match handle.await {
            Ok(result) => result,
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            // Cancelled only while the runtime shuts down.
            Err(_) => std::future::pending().await,
        }
    }
}
