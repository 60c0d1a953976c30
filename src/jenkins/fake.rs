//! In-memory Jenkins used by unit tests.

use super::*;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct FakeJob {
    name: String,
    /// Branch name and the duration of its last successful build, if any.
    branches: Vec<(String, Option<u64>)>,
}

#[derive(Debug, Clone)]
struct FakeState {
    info: ServerInfo,
    /// HTTP status returned instead of the identity.
    info_status: Option<u16>,
    jobs: Vec<FakeJob>,
    queue: usize,
    views: Vec<ViewInfo>,
    nodes: Vec<NodeInfo>,
    failing: HashSet<String>,
    hits: HashMap<String, usize>,
}

/// Scriptable Jenkins. Operations listed in `failing` return a network
/// error; keys are `info`, `jobs`, `queue`, `views`, `nodes`,
/// `inner:<job>` and `build:<job>/<branch>`.
pub struct FakeJenkins {
    state: Mutex<FakeState>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    category_calls: AtomicUsize,
}

impl FakeJenkins {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                info: ServerInfo {
                    mode: "NORMAL".to_string(),
                    num_executors: 2,
                    use_security: true,
                    ..Default::default()
                },
                info_status: None,
                jobs: Vec::new(),
                queue: 0,
                views: Vec::new(),
                nodes: Vec::new(),
                failing: HashSet::new(),
                hits: HashMap::new(),
            }),
            delay: None,
            calls: AtomicUsize::new(0),
            category_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_job(self, name: &str, branches: &[(&str, Option<u64>)]) -> Self {
        self.state.lock().unwrap().jobs.push(FakeJob {
            name: name.to_string(),
            branches: branches
                .iter()
                .map(|(b, d)| (b.to_string(), *d))
                .collect(),
        });
        self
    }

    pub fn with_queue(self, depth: usize) -> Self {
        self.set_queue(depth);
        self
    }

    pub fn with_view(self, name: &str, jobs: &[&str]) -> Self {
        self.state.lock().unwrap().views.push(ViewInfo {
            name: name.to_string(),
            jobs: jobs.iter().map(|j| JobRef::named(j)).collect(),
        });
        self
    }

    pub fn with_node(self, node: NodeInfo) -> Self {
        self.state.lock().unwrap().nodes.push(node);
        self
    }

    pub fn with_empty_identity(self) -> Self {
        self.state.lock().unwrap().info = ServerInfo::default();
        self
    }

    /// Answer the identity request with an HTTP error status.
    pub fn with_identity_status(self, status: u16) -> Self {
        self.state.lock().unwrap().info_status = Some(status);
        self
    }

    pub fn failing(self, key: &str) -> Self {
        self.set_failing(key, true);
        self
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_queue(&self, depth: usize) {
        self.state.lock().unwrap().queue = depth;
    }

    pub fn set_failing(&self, key: &str, failing: bool) {
        let mut state = self.state.lock().unwrap();
        if failing {
            state.failing.insert(key.to_string());
        } else {
            state.failing.remove(key);
        }
    }

    /// Total number of API calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls other than `server_info`.
    pub fn category_calls(&self) -> usize {
        self.category_calls.load(Ordering::SeqCst)
    }

    /// Number of calls made with the given failure key.
    pub fn calls_to(&self, key: &str) -> usize {
        self.state.lock().unwrap().hits.get(key).copied().unwrap_or(0)
    }

    async fn enter(&self, key: &str) -> Result<FakeState, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if key != "info" {
            self.category_calls.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let state = {
            let mut state = self.state.lock().unwrap();
            *state.hits.entry(key.to_string()).or_insert(0) += 1;
            state.clone()
        };
        if state.failing.contains(key) {
            return Err(ApiError::Network(format!("{} unavailable", key)));
        }
        Ok(state)
    }
}

#[async_trait]
impl JenkinsApi for FakeJenkins {
    async fn server_info(&self) -> Result<ServerInfo, ApiError> {
        let state = self.enter("info").await?;
        if let Some(status) = state.info_status {
            return Err(ApiError::Status {
                url: "/api/json".to_string(),
                status,
            });
        }
        Ok(state.info)
    }

    async fn jobs(&self) -> Result<Vec<JobRef>, ApiError> {
        let state = self.enter("jobs").await?;
        Ok(state.jobs.iter().map(|j| JobRef::named(&j.name)).collect())
    }

    async fn queue(&self) -> Result<Vec<QueueItem>, ApiError> {
        let state = self.enter("queue").await?;
        Ok((0..state.queue as u64).map(|id| QueueItem { id }).collect())
    }

    async fn views(&self) -> Result<Vec<ViewInfo>, ApiError> {
        Ok(self.enter("views").await?.views)
    }

    async fn nodes(&self) -> Result<Vec<NodeInfo>, ApiError> {
        Ok(self.enter("nodes").await?.nodes)
    }

    async fn inner_jobs(&self, job: &str) -> Result<Vec<JobRef>, ApiError> {
        let state = self.enter(&format!("inner:{}", job)).await?;
        let job = state
            .jobs
            .iter()
            .find(|j| j.name == job)
            .ok_or_else(|| ApiError::Status {
                url: format!("/job/{}", job),
                status: 404,
            })?;
        Ok(job.branches.iter().map(|(b, _)| JobRef::named(b)).collect())
    }

    async fn last_successful_build(
        &self,
        job: &str,
        branch: &str,
    ) -> Result<Option<BuildInfo>, ApiError> {
        let state = self.enter(&format!("build:{}/{}", job, branch)).await?;
        let duration = state
            .jobs
            .iter()
            .find(|j| j.name == job)
            .and_then(|j| j.branches.iter().find(|(b, _)| b == branch))
            .and_then(|(_, d)| *d);
        Ok(duration.map(|duration| BuildInfo {
            number: 1,
            duration,
        }))
    }
}
