//! Tdarr implementation of the farm port.
//!
//! Tdarr exposes a generic `cruddb` update primitive keyed by collection
//! and document id; both the global pause flag and job record mutations go
//! through it. Topology, cancellation, the status table, and job reports
//! each have a dedicated v2 endpoint.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{CancelledJob, FarmClient, NodeSnapshot, WorkerSnapshot};
use crate::error::ClientError;

const SETTINGS_COLLECTION: &str = "SettingsGlobalJSONDB";
const SETTINGS_DOC_ID: &str = "globalsettings";
const FILES_COLLECTION: &str = "FileJSONDB";
const QUEUED_DECISION: &str = "Queued";

/// Tdarr's table id for the error/cancelled classification.
const ERROR_TABLE: &str = "table3";
/// Rows fetched per reconciliation pass. Rows beyond the page are only
/// considered on a later pass, if they are still in the table then.
const STATUS_PAGE_SIZE: u32 = 500;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);
/// Server-side budget Tdarr applies to a cruddb operation, milliseconds.
const CRUDDB_TIMEOUT_MS: u64 = 20_000;

/// Client for a Tdarr server's v2 API.
#[derive(Debug, Clone)]
pub struct TdarrClient {
    http: reqwest::Client,
    base_url: String,
}

impl TdarrClient {
    /// Creates a client for the given base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post(
        &self,
        path: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<reqwest::Response, ClientError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .timeout(timeout)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        Ok(response)
    }

    async fn cruddb_update(
        &self,
        collection: &str,
        doc_id: &str,
        obj: Value,
    ) -> Result<(), ClientError> {
        let body = json!({
            "data": {
                "collection": collection,
                "mode": "update",
                "docID": doc_id,
                "obj": obj,
            },
            "timeout": CRUDDB_TIMEOUT_MS,
        });
        self.post("/api/v2/cruddb", &body, COMMAND_TIMEOUT).await?;
        Ok(())
    }
}

/// Shape of a Tdarr status-table page.
#[derive(Debug, Default, Deserialize)]
struct StatusPage {
    #[serde(default)]
    array: Vec<Value>,
}

/// Decodes one node entry from the topology snapshot, or `None` when its
/// shape is unusable. Malformed workers inside an otherwise sound node are
/// dropped individually.
fn decode_node(node_id: &str, value: Value) -> Option<NodeSnapshot> {
    let Value::Object(node) = value else {
        warn!("node {node_id}: snapshot entry is not an object, skipping");
        return None;
    };

    let mut workers = BTreeMap::new();
    match node.get("workers") {
        Some(Value::Object(map)) => {
            for (worker_id, details) in map {
                match serde_json::from_value::<WorkerSnapshot>(details.clone()) {
                    Ok(worker) => {
                        workers.insert(worker_id.clone(), worker);
                    }
                    Err(err) => warn!(
                        "node {node_id}: worker {worker_id} has malformed shape, skipping: {err}"
                    ),
                }
            }
        }
        Some(Value::Null) | None => {
            debug!("node {node_id}: no workers in snapshot");
        }
        Some(_) => {
            warn!("node {node_id}: workers field is not an object, skipping");
        }
    }

    Some(NodeSnapshot { workers })
}

#[async_trait]
impl FarmClient for TdarrClient {
    async fn set_global_pause(&self, paused: bool) -> Result<(), ClientError> {
        self.cruddb_update(
            SETTINGS_COLLECTION,
            SETTINGS_DOC_ID,
            json!({ "pauseAllNodes": paused }),
        )
        .await
    }

    async fn list_nodes(
        &self,
    ) -> Result<BTreeMap<String, NodeSnapshot>, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/v2/get-nodes", self.base_url))
            .timeout(SNAPSHOT_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let body = response.text().await?;
        let raw: BTreeMap<String, Value> = serde_json::from_str(&body)?;

        let mut nodes = BTreeMap::new();
        for (node_id, value) in raw {
            if let Some(node) = decode_node(&node_id, value) {
                nodes.insert(node_id, node);
            }
        }
        Ok(nodes)
    }

    async fn cancel_worker(
        &self,
        node_id: &str,
        worker_id: &str,
        cause: &str,
    ) -> Result<(), ClientError> {
        let body = json!({
            "data": {
                "nodeID": node_id,
                "workerID": worker_id,
                "cause": cause,
            }
        });
        self.post("/api/v2/cancel-worker-item", &body, COMMAND_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn requeue_job(&self, job_id: &str) -> Result<(), ClientError> {
        let now_ms = Utc::now().timestamp_millis();
        self.cruddb_update(
            FILES_COLLECTION,
            job_id,
            json!({ "lastUpdated": now_ms }),
        )
        .await?;
        self.cruddb_update(
            FILES_COLLECTION,
            job_id,
            json!({
                "TranscodeDecisionMaker": QUEUED_DECISION,
                "createdAt": now_ms,
            }),
        )
        .await
    }

    async fn list_cancelled_jobs(
        &self,
    ) -> Result<Vec<CancelledJob>, ClientError> {
        let body = json!({
            "data": {
                "start": 0,
                "pageSize": STATUS_PAGE_SIZE,
                "filters": [],
                "sorts": [],
                "opts": { "table": ERROR_TABLE },
            }
        });
        let response = self
            .post("/api/v2/client-files-tx", &body, SNAPSHOT_TIMEOUT)
            .await?;
        let text = response.text().await?;
        let page: StatusPage = serde_json::from_str(&text)?;

        let mut rows = Vec::with_capacity(page.array.len());
        for value in page.array {
            match serde_json::from_value::<CancelledJob>(value) {
                Ok(row) => rows.push(row),
                Err(err) => {
                    warn!("status row has malformed shape, skipping: {err}");
                }
            }
        }
        Ok(rows)
    }

    async fn list_job_reports(
        &self,
        footprint_id: &str,
    ) -> Result<Vec<String>, ClientError> {
        let body = json!({ "data": { "footprintId": footprint_id } });
        let response = self
            .post("/api/v2/list-footprintId-reports", &body, COMMAND_TIMEOUT)
            .await?;
        let text = response.text().await?;
        let reports = serde_json::from_str(&text)?;
        Ok(reports)
    }

    async fn read_job_report(
        &self,
        footprint_id: &str,
        job_id: &str,
        report_id: &str,
    ) -> Result<String, ClientError> {
        let body = json!({
            "data": {
                "footprintId": footprint_id,
                "jobId": job_id,
                "jobFileId": report_id,
            }
        });
        let response = self
            .post("/api/v2/read-job-file", &body, COMMAND_TIMEOUT)
            .await?;
        Ok(response.text().await?)
    }
}
