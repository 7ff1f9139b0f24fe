//! Hand-rolled recording fakes for the external ports, shared by the
//! engine and controller tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::ClientError;
use crate::farm::{CancelledJob, FarmClient, NodeSnapshot, WorkerSnapshot};
use crate::playback::{NowPlayingItem, PlayState, Session, SessionSource};

/// One observed call against the farm port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FarmCall {
    SetGlobalPause(bool),
    ListNodes,
    CancelWorker {
        node_id: String,
        worker_id: String,
        cause: String,
    },
    RequeueJob(String),
    ListCancelledJobs,
    ListJobReports(String),
    ReadJobReport {
        footprint_id: String,
        job_id: String,
        report_id: String,
    },
}

impl FarmCall {
    pub fn cancel(node_id: &str, worker_id: &str, cause: &str) -> Self {
        Self::CancelWorker {
            node_id: node_id.to_string(),
            worker_id: worker_id.to_string(),
            cause: cause.to_string(),
        }
    }
}

fn unavailable() -> ClientError {
    ClientError::Status(StatusCode::SERVICE_UNAVAILABLE)
}

/// Configurable fake farm that records every call made against it.
///
/// Report texts are keyed `"{report_id}@{footprint_id}"`; a missing key
/// reads as empty text (no marker).
#[derive(Default)]
pub struct RecordingFarm {
    calls: Mutex<Vec<FarmCall>>,
    nodes: BTreeMap<String, NodeSnapshot>,
    cancelled_jobs: Vec<CancelledJob>,
    reports: BTreeMap<String, Vec<String>>,
    report_texts: BTreeMap<String, String>,
    fail_list_nodes: bool,
    fail_list_cancelled: bool,
    fail_cancel_for: Option<String>,
    fail_requeue_for: Option<String>,
    fail_report_read_for: Option<String>,
}

impl RecordingFarm {
    pub fn with_nodes<'a, I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, NodeSnapshot)>,
    {
        self.nodes = nodes
            .into_iter()
            .map(|(id, node)| (id.to_string(), node))
            .collect();
        self
    }

    pub fn with_cancelled_jobs<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = CancelledJob>,
    {
        self.cancelled_jobs = rows.into_iter().collect();
        self
    }

    pub fn with_reports<'a, I>(mut self, footprint_id: &str, reports: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.reports.insert(
            footprint_id.to_string(),
            reports.into_iter().map(str::to_string).collect(),
        );
        self
    }

    pub fn with_report_text(mut self, key: &str, text: String) -> Self {
        self.report_texts.insert(key.to_string(), text);
        self
    }

    pub fn failing_list_nodes(mut self) -> Self {
        self.fail_list_nodes = true;
        self
    }

    pub fn failing_list_cancelled(mut self) -> Self {
        self.fail_list_cancelled = true;
        self
    }

    pub fn failing_cancel_for(mut self, worker_id: &str) -> Self {
        self.fail_cancel_for = Some(worker_id.to_string());
        self
    }

    pub fn failing_requeue_for(mut self, job_id: &str) -> Self {
        self.fail_requeue_for = Some(job_id.to_string());
        self
    }

    pub fn failing_report_read_for(mut self, key: &str) -> Self {
        self.fail_report_read_for = Some(key.to_string());
        self
    }

    pub fn calls(&self) -> Vec<FarmCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: FarmCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl FarmClient for RecordingFarm {
    async fn set_global_pause(&self, paused: bool) -> Result<(), ClientError> {
        self.record(FarmCall::SetGlobalPause(paused));
        Ok(())
    }

    async fn list_nodes(
        &self,
    ) -> Result<BTreeMap<String, NodeSnapshot>, ClientError> {
        self.record(FarmCall::ListNodes);
        if self.fail_list_nodes {
            return Err(unavailable());
        }
        Ok(self.nodes.clone())
    }

    async fn cancel_worker(
        &self,
        node_id: &str,
        worker_id: &str,
        cause: &str,
    ) -> Result<(), ClientError> {
        self.record(FarmCall::cancel(node_id, worker_id, cause));
        if self.fail_cancel_for.as_deref() == Some(worker_id) {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn requeue_job(&self, job_id: &str) -> Result<(), ClientError> {
        self.record(FarmCall::RequeueJob(job_id.to_string()));
        if self.fail_requeue_for.as_deref() == Some(job_id) {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn list_cancelled_jobs(
        &self,
    ) -> Result<Vec<CancelledJob>, ClientError> {
        self.record(FarmCall::ListCancelledJobs);
        if self.fail_list_cancelled {
            return Err(unavailable());
        }
        Ok(self.cancelled_jobs.clone())
    }

    async fn list_job_reports(
        &self,
        footprint_id: &str,
    ) -> Result<Vec<String>, ClientError> {
        self.record(FarmCall::ListJobReports(footprint_id.to_string()));
        Ok(self.reports.get(footprint_id).cloned().unwrap_or_default())
    }

    async fn read_job_report(
        &self,
        footprint_id: &str,
        job_id: &str,
        report_id: &str,
    ) -> Result<String, ClientError> {
        self.record(FarmCall::ReadJobReport {
            footprint_id: footprint_id.to_string(),
            job_id: job_id.to_string(),
            report_id: report_id.to_string(),
        });
        let key = format!("{report_id}@{footprint_id}");
        if self.fail_report_read_for.as_deref() == Some(key.as_str()) {
            return Err(unavailable());
        }
        Ok(self.report_texts.get(&key).cloned().unwrap_or_default())
    }
}

/// Builds a node snapshot from `(worker id, snapshot)` pairs.
pub fn node<'a, I>(workers: I) -> NodeSnapshot
where
    I: IntoIterator<Item = (&'a str, WorkerSnapshot)>,
{
    NodeSnapshot {
        workers: workers
            .into_iter()
            .map(|(id, worker)| (id.to_string(), worker))
            .collect(),
    }
}

pub fn worker_busy(file: &str) -> WorkerSnapshot {
    WorkerSnapshot {
        file: Some(file.to_string()),
    }
}

pub fn worker_idle() -> WorkerSnapshot {
    WorkerSnapshot { file: None }
}

/// Builds `count` sessions actively playing video.
pub fn video_sessions(count: usize) -> Vec<Session> {
    (0..count)
        .map(|i| Session {
            user_name: Some(format!("viewer-{i}")),
            client: Some("Web".to_string()),
            play_state: Some(PlayState {
                is_paused: Some(false),
            }),
            now_playing_item: Some(NowPlayingItem {
                media_type: Some("Video".to_string()),
            }),
        })
        .collect()
}

/// Session source that replays a fixed script of poll results, then keeps
/// answering with an empty session list.
#[derive(Default)]
pub struct ScriptedSessions {
    steps: Mutex<VecDeque<Result<Vec<Session>, ClientError>>>,
}

impl ScriptedSessions {
    pub fn new<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<Session>, ClientError>>,
    {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
        }
    }
}

#[async_trait]
impl SessionSource for ScriptedSessions {
    async fn fetch_sessions(&self) -> Result<Vec<Session>, ClientError> {
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
