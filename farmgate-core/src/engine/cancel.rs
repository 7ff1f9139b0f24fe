//! Cancels in-flight work across all farm nodes after a pause.

use tracing::{debug, info, warn};

use crate::farm::FarmClient;

/// Sweeps every node's workers and cancels each in-progress item, tagging
/// the given cause.
///
/// Best-effort by contract: the return value counts cancellation requests
/// the farm accepted, not a guarantee that the farm is idle afterwards.
/// One worker's failure never stops the sweep, and nothing is retried here;
/// a worker that slips through is observed again on the next pause
/// transition.
pub struct CancellationEngine<'a> {
    farm: &'a (dyn FarmClient + 'a),
}

impl std::fmt::Debug for CancellationEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationEngine").finish_non_exhaustive()
    }
}

impl<'a> CancellationEngine<'a> {
    /// Borrows the farm port for one pass.
    pub fn new(farm: &'a dyn FarmClient) -> Self {
        Self { farm }
    }

    /// Runs one cancellation pass. Expects new work to already be
    /// suppressed; the caller pauses the farm first.
    pub async fn cancel_all_active(&self, cause: &str) -> usize {
        info!("cancelling active farm worker tasks");

        let nodes = match self.farm.list_nodes().await {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!("could not list farm nodes for cancellation: {err}");
                return 0;
            }
        };

        let mut cancelled = 0;
        for (node_id, node) in &nodes {
            for (worker_id, worker) in &node.workers {
                let Some(file) = worker.file.as_deref() else {
                    debug!(
                        "worker {worker_id} on node {node_id} is idle, nothing to cancel"
                    );
                    continue;
                };

                info!(
                    "cancelling worker {worker_id} on node {node_id} (file: {file})"
                );
                match self.farm.cancel_worker(node_id, worker_id, cause).await {
                    Ok(()) => cancelled += 1,
                    // The worker may already have finished or moved on; the
                    // snapshot carries no consistency guarantee.
                    Err(err) => warn!(
                        "failed to cancel worker {worker_id} on node {node_id}: {err}"
                    ),
                }
            }
        }

        if cancelled > 0 {
            info!("sent {cancelled} worker cancellation request(s)");
        } else {
            info!("no active worker tasks found to cancel");
        }
        cancelled
    }
}
