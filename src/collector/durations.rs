//! Build duration collection.
//!
//! One task per job lists the job's branches, then one task per branch
//! fetches the last successful build. Outbound requests share a semaphore so
//! large instances are not hammered. Failures of a single job or branch are
//! logged and dropped.
//!
//! Every task watches the cycle's cancellation token and returns at its next
//! await once it fires. Parents always drain their `JoinSet`, so when
//! [`DurationCollector::collect`] returns no fan-out task is left running.

use crate::cache::JobDuration;
use crate::jenkins::JenkinsApi;

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

type Results = Arc<Mutex<Vec<JobDuration>>>;

/// Collects `(job, branch, duration)` triples for every branch with a
/// successful build.
pub struct DurationCollector {
    api: Arc<dyn JenkinsApi>,
    limit: Arc<Semaphore>,
}

impl DurationCollector {
    pub fn new(api: Arc<dyn JenkinsApi>, max_concurrent_requests: usize) -> Self {
        Self {
            api,
            limit: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    /// Fan out over `jobs` and wait for every task.
    ///
    /// The result is sorted by job and branch. After `cancel` fires the
    /// result is incomplete and should be discarded.
    pub async fn collect(&self, jobs: &[String], cancel: &CancellationToken) -> Vec<JobDuration> {
        let results: Results = Arc::new(Mutex::new(Vec::new()));
        let mut tasks = JoinSet::new();

        for job in jobs {
            tasks.spawn(collect_job(
                Arc::clone(&self.api),
                Arc::clone(&self.limit),
                job.clone(),
                Arc::clone(&results),
                cancel.clone(),
            ));
        }

        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                tracing::error!("Duration task failed: {}", e);
            }
        }

        let mut durations =
            std::mem::take(&mut *results.lock().unwrap_or_else(PoisonError::into_inner));
        durations.sort();
        durations
    }
}

async fn collect_job(
    api: Arc<dyn JenkinsApi>,
    limit: Arc<Semaphore>,
    job: String,
    results: Results,
    cancel: CancellationToken,
) {
    let listing = async {
        let _permit = limit.acquire().await;
        api.inner_jobs(&job).await
    };
    let branches = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        res = listing => match res {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Job {}: failed to list branches: {}", job, e);
                return;
            }
        },
    };

    let mut tasks = JoinSet::new();
    for branch in branches {
        tasks.spawn(collect_branch(
            Arc::clone(&api),
            Arc::clone(&limit),
            job.clone(),
            branch.name,
            Arc::clone(&results),
            cancel.clone(),
        ));
    }

    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            tracing::error!("Branch task for {} failed: {}", job, e);
        }
    }
}

async fn collect_branch(
    api: Arc<dyn JenkinsApi>,
    limit: Arc<Semaphore>,
    job: String,
    branch: String,
    results: Results,
    cancel: CancellationToken,
) {
    let fetch = async {
        let _permit = limit.acquire().await;
        api.last_successful_build(&job, &branch).await
    };
    let build = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        res = fetch => res,
    };

    match build {
        Ok(Some(build)) => {
            results
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(JobDuration {
                    job_name: job,
                    branch_name: branch,
                    duration_millis: build.duration,
                });
        }
        Ok(None) => {
            tracing::debug!("Job {} branch {}: no successful build", job, branch);
        }
        Err(e) => {
            tracing::debug!(
                "Job {} branch {}: failed to get last successful build: {}",
                job,
                branch,
                e
            );
        }
    }
}
