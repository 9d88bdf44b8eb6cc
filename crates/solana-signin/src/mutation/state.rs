/*
[INPUT]:  Mutation lifecycle events
[OUTPUT]: Operation state and observable snapshots
[POS]:    Mutation layer - state definitions
[UPDATE]: When lifecycle states or snapshot fields change
*/

use chrono::{DateTime, Utc};

/// Lifecycle of a single tracked operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState<T, E> {
    Idle,
    Pending,
    Success(T),
    Failure(E),
}

/// Payload-free view of [`OperationState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationStatus {
    Idle,
    Pending,
    Success,
    Failure,
}

impl<T, E> Default for OperationState<T, E> {
    fn default() -> Self {
        OperationState::Idle
    }
}

impl<T, E> OperationState<T, E> {
    pub fn status(&self) -> OperationStatus {
        match self {
            OperationState::Idle => OperationStatus::Idle,
            OperationState::Pending => OperationStatus::Pending,
            OperationState::Success(_) => OperationStatus::Success,
            OperationState::Failure(_) => OperationStatus::Failure,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, OperationState::Pending)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            OperationState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            OperationState::Failure(error) => Some(error),
            _ => None,
        }
    }
}

/// Everything an observer can read about a mutation at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationSnapshot<T, E> {
    pub state: OperationState<T, E>,
    /// Failed attempts of the current invocation
    pub failure_count: u32,
    /// Most recent attempt failure, including ones that were retried
    pub failure_reason: Option<E>,
    /// Waiting for connectivity before the next attempt
    pub is_paused: bool,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl<T, E> Default for MutationSnapshot<T, E> {
    fn default() -> Self {
        Self {
            state: OperationState::Idle,
            failure_count: 0,
            failure_reason: None,
            is_paused: false,
            submitted_at: None,
        }
    }
}

impl<T, E> MutationSnapshot<T, E> {
    /// Fresh snapshot for an invocation that just started
    pub(crate) fn submitted(at: DateTime<Utc>) -> Self {
        Self {
            state: OperationState::Pending,
            submitted_at: Some(at),
            ..Self::default()
        }
    }
}
