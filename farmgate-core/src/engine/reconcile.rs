//! Re-admits jobs this controller killed, after a resume.
//!
//! The error/cancelled table carries no signal about *why* a job landed
//! there, so the cause string tagged at cancel time, round-tripped through
//! the job's own report, is the only reliable correlation between a
//! cancellation and its resulting row. Anything without the marker is a
//! genuine failure and is left for manual review.

use tracing::{debug, info, warn};

use crate::farm::FarmClient;

/// Scans the error/cancelled status table and requeues exactly the jobs
/// whose most recent report carries the cancellation marker.
pub struct ReconciliationEngine<'a> {
    farm: &'a (dyn FarmClient + 'a),
}

impl std::fmt::Debug for ReconciliationEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine").finish_non_exhaustive()
    }
}

impl<'a> ReconciliationEngine<'a> {
    /// Borrows the farm port for one pass.
    pub fn new(farm: &'a dyn FarmClient) -> Self {
        Self { farm }
    }

    /// Runs one reconciliation pass and returns the number of jobs
    /// requeued. Per-row failures are logged and skipped; the scan never
    /// aborts. Only one page of the table is considered per pass.
    pub async fn requeue_script_cancelled(&self, marker: &str) -> usize {
        let rows = match self.farm.list_cancelled_jobs().await {
            Ok(rows) => rows,
            Err(err) => {
                warn!("could not list error/cancelled jobs: {err}");
                return 0;
            }
        };

        info!("scanning {} error/cancelled row(s) for requeue", rows.len());

        let mut requeued = 0;
        for row in &rows {
            let (Some(footprint_id), Some(job_id), Some(table)) = (
                row.footprint_id.as_deref(),
                row.job_id.as_deref(),
                row.table.as_deref(),
            ) else {
                debug!("skipping row with missing identifiers: {row:?}");
                continue;
            };

            let reports = match self.farm.list_job_reports(footprint_id).await {
                Ok(reports) => reports,
                Err(err) => {
                    warn!("job {job_id}: could not list reports: {err}");
                    continue;
                }
            };
            // Report names sort consistently with recency, so the
            // lexicographic maximum is the most recent one.
            let Some(report_id) = reports.iter().max() else {
                debug!("job {job_id}: no reports for footprint {footprint_id}");
                continue;
            };

            let text = match self
                .farm
                .read_job_report(footprint_id, job_id, report_id)
                .await
            {
                Ok(text) => text,
                Err(err) => {
                    warn!("job {job_id}: could not read report {report_id}: {err}");
                    continue;
                }
            };

            if !text.contains(marker) {
                debug!("job {job_id} failed on its own, leaving for review");
                continue;
            }

            info!(
                "requeueing job {job_id} from {table} (footprint {footprint_id})"
            );
            match self.farm.requeue_job(job_id).await {
                Ok(()) => requeued += 1,
                Err(err) => warn!("job {job_id}: requeue failed: {err}"),
            }
        }

        if requeued > 0 {
            info!("requeued {requeued} previously cancelled job(s)");
        }
        requeued
    }
}
