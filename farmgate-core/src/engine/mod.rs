//! The two per-transition passes: cancellation after a pause, requeue
//! reconciliation after a resume.

pub mod cancel;
pub mod reconcile;

pub use cancel::CancellationEngine;
pub use reconcile::ReconciliationEngine;
