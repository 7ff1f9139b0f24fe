//! Farm command surface: the write side of the control loop.

pub mod tdarr;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ClientError;

/// Cause string attached to every cancellation this controller issues.
///
/// The farm round-trips the cause into the job's report, so this exact
/// string reappearing in the most recent report is the sole discriminator
/// between "killed by us" and "failed on its own". Must never change
/// between a pause and the resume that reconciles it.
pub const CANCEL_CAUSE: &str = "Paused by script due to Jellyfin activity";

/// Point-in-time view of one worker slot on a farm node.
///
/// A snapshot only; the worker may finish or move on before a cancel call
/// lands, in which case the cancel legitimately fails.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerSnapshot {
    /// Reference to the file being transcoded; `None` for an idle slot.
    #[serde(default)]
    pub file: Option<String>,
}

impl WorkerSnapshot {
    /// A worker holding a file reference is mid-transcode.
    pub fn is_busy(&self) -> bool {
        self.file.is_some()
    }
}

/// Point-in-time view of one farm node and its worker slots.
#[derive(Debug, Clone, Default)]
pub struct NodeSnapshot {
    /// Worker slots keyed by worker id.
    pub workers: BTreeMap<String, WorkerSnapshot>,
}

/// Row in the farm's error/cancelled status table.
///
/// All fields are optional because the table is externally owned; rows
/// missing any identifier are skipped by reconciliation, not errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelledJob {
    /// Stable identity of the source file across transcode attempts.
    #[serde(default, rename = "footprintId")]
    pub footprint_id: Option<String>,
    /// Identity of this job's record.
    #[serde(default, rename = "_id")]
    pub job_id: Option<String>,
    /// Status table the row originated from.
    #[serde(default)]
    pub table: Option<String>,
}

/// Command port to the transcode farm.
///
/// Every operation is independently best-effort; callers isolate failures
/// per entity and never abort a batch because one entry failed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FarmClient: Send + Sync {
    /// Sets the farm's single global pause flag. Idempotent: repeating the
    /// same value is safe and has no further effect.
    async fn set_global_pause(&self, paused: bool) -> Result<(), ClientError>;

    /// Snapshot of all nodes and their worker slots. Malformed node or
    /// worker entries are skipped individually, never failing the listing.
    async fn list_nodes(&self)
    -> Result<BTreeMap<String, NodeSnapshot>, ClientError>;

    /// Asks the farm to cancel whatever the given worker is doing now,
    /// tagging the cause.
    async fn cancel_worker(
        &self,
        node_id: &str,
        worker_id: &str,
        cause: &str,
    ) -> Result<(), ClientError>;

    /// Re-admits a job to the processing queue via two sequential record
    /// mutations: bump the last-updated timestamp, then set the transcode
    /// decision back to queued with a fresh creation timestamp. If the
    /// first succeeds and the second fails the record is left inconsistent
    /// but recoverable; no retry happens inside this call.
    async fn requeue_job(&self, job_id: &str) -> Result<(), ClientError>;

    /// One bounded page of the error/cancelled status table.
    async fn list_cancelled_jobs(&self) -> Result<Vec<CancelledJob>, ClientError>;

    /// Report identifiers recorded for a footprint, unordered.
    async fn list_job_reports(
        &self,
        footprint_id: &str,
    ) -> Result<Vec<String>, ClientError>;

    /// Full text of one job report.
    async fn read_job_report(
        &self,
        footprint_id: &str,
        job_id: &str,
        report_id: &str,
    ) -> Result<String, ClientError>;
}
