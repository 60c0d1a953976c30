//! Jenkins JSON API response types.

use serde::Deserialize;

/// Response of `GET /api/json`, trimmed to the identity fields.
///
/// Jenkins answers with an empty object when the credentials carry no read
/// permission, which deserializes to the default value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerInfo {
    pub mode: String,
    pub node_name: String,
    pub node_description: Option<String>,
    pub num_executors: u32,
    pub use_security: bool,
}

impl ServerInfo {
    /// True when the server identified itself with nothing at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobRef {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl JobRef {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<JobRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueItem {
    #[serde(default)]
    pub id: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueList {
    #[serde(default)]
    pub items: Vec<QueueItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewInfo {
    pub name: String,
    #[serde(default)]
    pub jobs: Vec<JobRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewList {
    #[serde(default)]
    pub views: Vec<ViewInfo>,
}

/// One entry of `GET /computer/api/json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeInfo {
    pub display_name: String,
    pub offline: bool,
    pub idle: bool,
    pub jnlp_agent: bool,
    pub num_executors: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub computer: Vec<NodeInfo>,
}

/// A single build; `duration` is in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildInfo {
    pub number: u64,
    pub duration: u64,
}
