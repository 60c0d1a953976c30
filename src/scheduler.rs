//! Scheduler driving the poll cycles.
//!
//! A cycle identifies itself to Jenkins, fetches every category, and
//! publishes one snapshot into the cache. Category failures are tolerated:
//! the failing category contributes its zero value and the cycle is marked
//! failed, but the rest of the snapshot is still published.

use crate::cache::{HealthStatus, Snapshot, SnapshotCache};
use crate::collector::{
    collect_agents, collect_job_names, collect_queue_depth, collect_views, DurationCollector,
};
use crate::jenkins::{ApiError, JenkinsApi};

use std::future::Future;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Reasons a cycle ends without publishing.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("failed to reach Jenkins: {0}")]
    Connection(#[from] ApiError),
    #[error("Jenkins rejected the configured credentials")]
    Unauthorized,
    #[error("scheduler stopped")]
    Cancelled,
}

/// Summary of a cycle that reached the fetch stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Categories whose fetch failed.
    pub failed: Vec<&'static str>,
}

impl CycleReport {
    pub fn health(&self) -> HealthStatus {
        if self.failed.is_empty() {
            HealthStatus::Ok
        } else {
            HealthStatus::Failed
        }
    }

    /// Unwrap a category result, recording the failure and falling back to
    /// the zero value.
    fn settle<T: Default>(&mut self, category: &'static str, result: Result<T, ApiError>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to collect {} from Jenkins: {}", category, e);
                self.failed.push(category);
                T::default()
            }
        }
    }
}

/// Periodic poller owning the write side of the snapshot cache.
pub struct Scheduler {
    api: Arc<dyn JenkinsApi>,
    cache: Arc<SnapshotCache>,
    durations: DurationCollector,
    interval: Duration,
    cycle: Mutex<()>,
    cancel: CancellationToken,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        api: Arc<dyn JenkinsApi>,
        cache: Arc<SnapshotCache>,
        interval: Duration,
        fetch_concurrency: usize,
    ) -> Self {
        Self {
            durations: DurationCollector::new(Arc::clone(&api), fetch_concurrency),
            api,
            cache,
            interval,
            cycle: Mutex::new(()),
            cancel: CancellationToken::new(),
            handle: std::sync::Mutex::new(None),
        }
    }

    /// Spawn the background loop. The first cycle runs immediately, later
    /// ones on every interval tick. Calling `start` twice has no effect.
    pub fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            tracing::warn!("Scheduler already started");
            return;
        }

        tracing::info!("Starting scheduler, polling every {:?}", self.interval);

        let scheduler = Arc::clone(self);
        *handle = Some(tokio::spawn(async move {
            scheduler.run_loop().await;
        }));
    }

    /// Signal the loop to stop and wait until it has exited. An in-flight
    /// cycle is abandoned without publishing, and its fan-out tasks have
    /// finished by the time this returns.
    pub async fn stop(&self) {
        self.cancel.cancel();

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Scheduler task failed: {}", e);
            }
            tracing::info!("Scheduler stopped");
        }
    }

    async fn run_loop(&self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => match self.run_once().await {
                    Ok(_) => {}
                    Err(PollError::Cancelled) => {
                        tracing::info!("Abandoned in-flight poll cycle");
                        break;
                    }
                    Err(e) => tracing::error!("Poll cycle aborted: {}", e),
                },
            }
        }
    }

    /// Await `fut` unless the scheduler is stopped first.
    async fn unless_stopped<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            out = fut => Some(out),
        }
    }

    /// Run one full cycle. Concurrent callers are serialized: a second call
    /// waits for the running cycle to finish and then runs its own.
    pub async fn run_once(&self) -> Result<CycleReport, PollError> {
        let _cycle = self.cycle.lock().await;
        tracing::info!("Collecting metrics from Jenkins");

        let identity = self
            .unless_stopped(self.api.server_info())
            .await
            .ok_or(PollError::Cancelled)?;
        let info = match identity {
            Ok(info) => info,
            Err(ApiError::Status {
                status: 401 | 403, ..
            }) => {
                self.cache.set_health(HealthStatus::Failed);
                return Err(PollError::Unauthorized);
            }
            Err(e) => {
                self.cache.set_health(HealthStatus::Failed);
                return Err(PollError::Connection(e));
            }
        };
        if info.is_empty() {
            self.cache.set_health(HealthStatus::Failed);
            return Err(PollError::Unauthorized);
        }

        let api = self.api.as_ref();

        // The job list is fetched once and feeds both the job count and the
        // duration fan-out. The fan-out watches the token itself so that its
        // tasks are drained, not dropped.
        let inventory = async {
            let Some(jobs) = self.unless_stopped(collect_job_names(api)).await else {
                return None;
            };
            let durations = match &jobs {
                Ok(names) => self.durations.collect(names, &self.cancel).await,
                Err(_) => Vec::new(),
            };
            Some((jobs, durations))
        };

        let (inventory, queue, views, agents) = tokio::join!(
            inventory,
            self.unless_stopped(collect_queue_depth(api)),
            self.unless_stopped(collect_views(api)),
            self.unless_stopped(collect_agents(api)),
        );
        let (Some((jobs, durations)), Some(queue), Some(views), Some(agents)) =
            (inventory, queue, views, agents)
        else {
            return Err(PollError::Cancelled);
        };
        if self.cancel.is_cancelled() {
            return Err(PollError::Cancelled);
        }

        let mut report = CycleReport::default();
        let snapshot = Snapshot {
            job_count: report.settle("jobs", jobs).len(),
            queue_depth: report.settle("queue", queue),
            views: report.settle("views", views),
            agents: report.settle("agents", agents),
            job_durations: durations,
        };

        tracing::info!(
            "Collected {} jobs, {} queued, {} views, {} durations",
            snapshot.job_count,
            snapshot.queue_depth,
            snapshot.views.len(),
            snapshot.job_durations.len()
        );

        self.cache.publish(snapshot, report.health());
        Ok(report)
    }
}
