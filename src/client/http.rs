use super::{Executor, FileEntry, RunRequest, StatusMap};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::graph::NodeStatus;
use ahash::AHashMap;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct SubmitResponse {
    dag_id: String,
}

#[derive(Deserialize)]
struct LogsResponse {
    logs: String,
}

/// [`Executor`] over the backend's REST API.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    base_url: String,
}

impl HttpExecutor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;
        decode(url, res).await
    }
}

async fn decode<T: DeserializeOwned>(url: String, res: Response) -> Result<T, ClientError> {
    if !res.status().is_success() {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        return Err(ClientError::Status { url, status, body });
    }
    res.json::<T>().await.map_err(|e| ClientError::Decode {
        url,
        message: e.to_string(),
    })
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn ping(&self) -> Result<Value, ClientError> {
        self.get_json("/api/ping").await
    }

    async fn list_files(&self) -> Result<Vec<FileEntry>, ClientError> {
        let pairs: Vec<(String, String)> = self.get_json("/files").await?;
        Ok(pairs.into_iter().map(FileEntry::from).collect())
    }

    async fn submit_run(&self, request: &RunRequest) -> Result<String, ClientError> {
        let url = self.url("/run");
        debug!(%url, nodes = request.nodes.len(), edges = request.edges.len(), "POST");
        let res = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;
        let body: SubmitResponse = decode(url, res).await?;
        Ok(body.dag_id)
    }

    async fn run_status(&self, dag_id: &str) -> Result<StatusMap, ClientError> {
        let raw: AHashMap<String, String> = self.get_json(&format!("/status/{}", dag_id)).await?;
        Ok(raw
            .into_iter()
            .map(|(node_id, status)| {
                let status = status.parse().unwrap_or_else(|unknown: String| {
                    warn!(node = %node_id, status = %unknown, "unknown node status, treating as pending");
                    NodeStatus::Pending
                });
                (node_id, status)
            })
            .collect())
    }

    async fn node_logs(&self, dag_id: &str, node_id: &str) -> Result<String, ClientError> {
        let body: LogsResponse = self
            .get_json(&format!("/logs/{}/{}", dag_id, node_id))
            .await?;
        Ok(body.logs)
    }

    async fn run_logs(&self, dag_id: &str) -> Result<String, ClientError> {
        let body: LogsResponse = self.get_json(&format!("/logs/{}", dag_id)).await?;
        Ok(body.logs)
    }
}
