//! Per-category collectors.
//!
//! Each collector issues its own Jenkins queries and normalizes the answer
//! into the types stored in a [`Snapshot`](crate::cache::Snapshot).

mod durations;

pub use durations::*;

use crate::cache::{AgentSummary, ViewSummary};
use crate::jenkins::{ApiError, JenkinsApi, NodeInfo};

/// Names of all top-level jobs.
pub async fn collect_job_names(api: &dyn JenkinsApi) -> Result<Vec<String>, ApiError> {
    let jobs = api.jobs().await?;
    Ok(jobs.into_iter().map(|job| job.name).collect())
}

/// Number of items waiting in the build queue.
pub async fn collect_queue_depth(api: &dyn JenkinsApi) -> Result<usize, ApiError> {
    Ok(api.queue().await?.len())
}

pub async fn collect_views(api: &dyn JenkinsApi) -> Result<Vec<ViewSummary>, ApiError> {
    let views = api.views().await?;
    Ok(views
        .into_iter()
        .map(|view| ViewSummary {
            name: view.name,
            job_count: view.jobs.len(),
        })
        .collect())
}

pub async fn collect_agents(api: &dyn JenkinsApi) -> Result<AgentSummary, ApiError> {
    let nodes = api.nodes().await?;
    Ok(summarize_agents(&nodes))
}

/// Aggregate node states.
///
/// Only JNLP agents count toward `total` and `idle`, and an agent is idle only
/// while it is online. `busy` is derived as `total - idle`.
pub fn summarize_agents(nodes: &[NodeInfo]) -> AgentSummary {
    let mut agents = AgentSummary::default();

    for node in nodes {
        if node.offline {
            agents.offline += 1.0;
        } else {
            agents.online += 1.0;
        }

        if node.jnlp_agent {
            agents.total += 1.0;
            if node.idle && !node.offline {
                agents.idle += 1.0;
            }
        }
    }
    agents.busy = agents.total - agents.idle;

    agents
}
