//! Snapshot cache shared between the poller and the scrape handlers.
//!
//! The poller is the only writer. A cycle builds a complete [`Snapshot`] and
//! swaps it in whole; readers clone an `Arc` under a read lock and never see
//! a snapshot that mixes two cycles.

use std::sync::{Arc, PoisonError, RwLock};

/// Job count of a single view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSummary {
    pub name: String,
    pub job_count: usize,
}

/// Node counters. `total`, `idle` and `busy` only count JNLP agents,
/// `online` and `offline` count every node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgentSummary {
    pub total: f64,
    pub idle: f64,
    pub busy: f64,
    pub online: f64,
    pub offline: f64,
}

/// Duration of the last successful build of one branch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct JobDuration {
    pub job_name: String,
    pub branch_name: String,
    pub duration_millis: u64,
}

/// Everything one poll cycle collected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub job_count: usize,
    pub queue_depth: usize,
    pub views: Vec<ViewSummary>,
    pub agents: AgentSummary,
    pub job_durations: Vec<JobDuration>,
}

/// Outcome of the most recent poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HealthStatus {
    /// No cycle has finished yet.
    #[default]
    Unknown,
    Ok,
    Failed,
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Arc<Snapshot>>,
    health: HealthStatus,
}

/// Holder of the latest snapshot and health status.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    state: RwLock<CacheState>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `snapshot` as current. The previous one is dropped once the
    /// last reader releases it.
    pub fn replace(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.snapshot = Some(snapshot);
    }

    /// Install a snapshot together with the health of the cycle that built it.
    pub fn publish(&self, snapshot: Snapshot, health: HealthStatus) {
        let snapshot = Arc::new(snapshot);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.snapshot = Some(snapshot);
        state.health = health;
    }

    pub fn set_health(&self, health: HealthStatus) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.health = health;
    }

    /// Current snapshot, `None` before the first publish.
    pub fn read(&self) -> Option<Arc<Snapshot>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.snapshot.clone()
    }

    pub fn health(&self) -> HealthStatus {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.health
    }

    /// Snapshot and health taken under the same lock.
    pub fn load(&self) -> (Option<Arc<Snapshot>>, HealthStatus) {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        (state.snapshot.clone(), state.health)
    }
}
