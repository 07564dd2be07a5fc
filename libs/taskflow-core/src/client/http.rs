//! JSON-over-HTTP record client
//!
//! Every operation is a `POST {api_url}/tables/{table}/{operation}` carrying
//! the project id and public key as headers.

use super::{BatchResponse, FetchParams, FetchResponse, RecordClient, RecordResponse};
use crate::config::TaskflowConfig;
use crate::error::{Result, TaskflowError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

const PROJECT_ID_HEADER: &str = "x-project-id";
const PUBLIC_KEY_HEADER: &str = "x-public-key";

/// Record client talking to the remote service over HTTP
#[derive(Debug, Clone)]
pub struct HttpRecordClient {
    http: reqwest::Client,
    api_url: String,
    project_id: String,
    public_key: String,
}

impl HttpRecordClient {
    /// Build a client from configuration
    ///
    /// # Errors
    /// Returns `TaskflowError::Configuration` if the configuration is invalid
    /// or the HTTP client cannot be built
    pub fn new(config: &TaskflowConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TaskflowError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            public_key: config.public_key.clone(),
        })
    }

    fn endpoint(&self, table: &str, operation: &str) -> String {
        format!("{}/tables/{table}/{operation}", self.api_url)
    }

    async fn post<T: DeserializeOwned>(&self, table: &str, operation: &str, body: Value) -> Result<T> {
        let url = self.endpoint(table, operation);
        debug!("POST {}", url);

        let resp = self
            .http
            .post(&url)
            .header(PROJECT_ID_HEADER, &self.project_id)
            .header(PUBLIC_KEY_HEADER, &self.public_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(TaskflowError::transport(format!(
                "{operation} {table} returned HTTP {}: {text}",
                status.as_u16()
            )));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl RecordClient for HttpRecordClient {
    #[instrument(skip(self, params))]
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> Result<FetchResponse> {
        self.post(table, "fetch", serde_json::to_value(params)?)
            .await
    }

    #[instrument(skip(self, params))]
    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        params: &FetchParams,
    ) -> Result<RecordResponse> {
        let mut body = serde_json::to_value(params)?;
        body["id"] = json!(id);
        self.post(table, "get", body).await
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn create_records(&self, table: &str, records: Vec<Value>) -> Result<BatchResponse> {
        self.post(table, "create", json!({ "records": records }))
            .await
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn update_records(&self, table: &str, records: Vec<Value>) -> Result<BatchResponse> {
        self.post(table, "update", json!({ "records": records }))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_records(&self, table: &str, ids: &[i64]) -> Result<BatchResponse> {
        self.post(table, "delete", json!({ "RecordIds": ids })).await
    }
}
