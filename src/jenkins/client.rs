//! HTTP implementation of the Jenkins API.

use super::*;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

const JOBS_TREE: &str = "jobs[name,url]";
const QUEUE_TREE: &str = "items[id]";
const VIEWS_TREE: &str = "views[name,jobs[name,url]]";
const NODES_TREE: &str = "computer[displayName,offline,idle,jnlpAgent,numExecutors]";
const BUILD_TREE: &str = "number,duration";

/// Jenkins client speaking the JSON API with basic auth.
#[derive(Clone)]
pub struct JenkinsClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: String,
    timeout: Duration,
}

impl JenkinsClient {
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid Jenkins URL {}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "Jenkins URL {} cannot be a base",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base,
            username: username.to_string(),
            password: password.to_string(),
            timeout,
        })
    }

    /// Build `{base}/{segments...}/api/json?tree=...`.
    fn endpoint(&self, segments: &[&str], tree: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::Config(format!("Jenkins URL {} cannot be a base", self.base)))?;
            path.pop_if_empty();
            path.extend(segments);
            path.extend(["api", "json"]);
        }
        if let Some(tree) = tree {
            url.query_pairs_mut().append_pair("tree", tree);
        }
        Ok(url)
    }

    /// GET a JSON document; a 404 yields `None`.
    async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, ApiError> {
        let response = self
            .http
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout(self.timeout)
                } else {
                    ApiError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| ApiError::Decode(format!("{}: {}", url, e)))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let target = url.to_string();
        self.get_optional(url).await?.ok_or(ApiError::Status {
            url: target,
            status: StatusCode::NOT_FOUND.as_u16(),
        })
    }
}

#[async_trait]
impl JenkinsApi for JenkinsClient {
    async fn server_info(&self) -> Result<ServerInfo, ApiError> {
        self.get(self.endpoint(&[], None)?).await
    }

    async fn jobs(&self) -> Result<Vec<JobRef>, ApiError> {
        let list: JobList = self.get(self.endpoint(&[], Some(JOBS_TREE))?).await?;
        Ok(list.jobs)
    }

    async fn queue(&self) -> Result<Vec<QueueItem>, ApiError> {
        let list: QueueList = self.get(self.endpoint(&["queue"], Some(QUEUE_TREE))?).await?;
        Ok(list.items)
    }

    async fn views(&self) -> Result<Vec<ViewInfo>, ApiError> {
        let list: ViewList = self.get(self.endpoint(&[], Some(VIEWS_TREE))?).await?;
        Ok(list.views)
    }

    async fn nodes(&self) -> Result<Vec<NodeInfo>, ApiError> {
        let list: NodeList = self
            .get(self.endpoint(&["computer"], Some(NODES_TREE))?)
            .await?;
        Ok(list.computer)
    }

    async fn inner_jobs(&self, job: &str) -> Result<Vec<JobRef>, ApiError> {
        let list: JobList = self
            .get(self.endpoint(&["job", job], Some(JOBS_TREE))?)
            .await?;
        Ok(list.jobs)
    }

    async fn last_successful_build(
        &self,
        job: &str,
        branch: &str,
    ) -> Result<Option<BuildInfo>, ApiError> {
        let url = self.endpoint(
            &["job", job, "job", branch, "lastSuccessfulBuild"],
            Some(BUILD_TREE),
        )?;
        self.get_optional(url).await
    }
}
