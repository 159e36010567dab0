use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
    pub upstream: String,
    pub reconnects: u64,
}

/// `{"status": "success" | "error", "data"?: [...], "message"?: "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Serialize)]
pub struct NewVertex {
    pub label: String,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct NewEdge {
    pub label: String,
    pub from: Value,
    pub to: Value,
    pub properties: Map<String, Value>,
}

pub struct GatewayClient {
    client: Client,
    gateway_url: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str) -> Self {
        Self {
            client: Client::new(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn health(&self) -> Result<Health, reqwest::Error> {
        self.client
            .get(format!("{}/health", self.gateway_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// Probe the upstream. The gateway always answers 200; check `is_success()`.
    pub async fn test_connection(&self) -> Result<ApiResponse, reqwest::Error> {
        self.client
            .post(format!("{}/test_connection", self.gateway_url))
            .send()
            .await?
            .json()
            .await
    }

    pub async fn add_vertex(
        &self,
        vertex: &NewVertex,
    ) -> Result<(StatusCode, ApiResponse), reqwest::Error> {
        let resp = self
            .client
            .post(format!("{}/vertices", self.gateway_url))
            .json(vertex)
            .send()
            .await?;
        let status = resp.status();
        Ok((status, resp.json().await?))
    }

    pub async fn add_edge(
        &self,
        edge: &NewEdge,
    ) -> Result<(StatusCode, ApiResponse), reqwest::Error> {
        let resp = self
            .client
            .post(format!("{}/edges", self.gateway_url))
            .json(edge)
            .send()
            .await?;
        let status = resp.status();
        Ok((status, resp.json().await?))
    }

    pub async fn vertices(&self) -> Result<(StatusCode, ApiResponse), reqwest::Error> {
        self.get_list("vertices").await
    }

    pub async fn edges(&self) -> Result<(StatusCode, ApiResponse), reqwest::Error> {
        self.get_list("edges").await
    }

    async fn get_list(&self, path: &str) -> Result<(StatusCode, ApiResponse), reqwest::Error> {
        let resp = self
            .client
            .get(format!("{}/{}", self.gateway_url, path))
            .send()
            .await?;
        let status = resp.status();
        Ok((status, resp.json().await?))
    }
}
