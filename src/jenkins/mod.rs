//! Jenkins remote API.
//!
//! The poller only talks to Jenkins through the [`JenkinsApi`] trait so that
//! cycles can be driven against an in-memory server in tests.

mod client;
mod models;

#[cfg(test)]
pub mod fake;

pub use client::*;
pub use models::*;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Jenkins API error types.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Read-only queries the exporter issues against Jenkins.
#[async_trait]
pub trait JenkinsApi: Send + Sync {
    /// Identity of the server as seen with the configured credentials.
    async fn server_info(&self) -> Result<ServerInfo, ApiError>;

    /// Top-level jobs.
    async fn jobs(&self) -> Result<Vec<JobRef>, ApiError>;

    /// Items waiting in the build queue.
    async fn queue(&self) -> Result<Vec<QueueItem>, ApiError>;

    /// All views with their member jobs.
    async fn views(&self) -> Result<Vec<ViewInfo>, ApiError>;

    /// All registered nodes.
    async fn nodes(&self) -> Result<Vec<NodeInfo>, ApiError>;

    /// Branch jobs nested under a job. Plain jobs have none.
    async fn inner_jobs(&self, job: &str) -> Result<Vec<JobRef>, ApiError>;

    /// Last successful build of `branch` inside `job`, `None` when the
    /// branch never succeeded.
    async fn last_successful_build(
        &self,
        job: &str,
        branch: &str,
    ) -> Result<Option<BuildInfo>, ApiError>;
}
