//! # Farmgate Core
//!
//! Control loop that throttles a background transcoding farm based on live
//! playback activity reported by a media server.
//!
//! While anyone is actively watching video, the farm is paused globally and
//! its in-flight work is cancelled with a tagged cause. Once playback ends
//! the farm is resumed and jobs that this controller killed (recognized by
//! the tag reappearing in their job reports) are re-admitted to the queue,
//! leaving genuinely failed jobs alone.
//!
//! The crate is organized around two external seams:
//!
//! - [`playback::SessionSource`] - read-only view of the media server's
//!   playback sessions, reduced to an activity count by
//!   [`playback::probe::ActivityProbe`].
//! - [`farm::FarmClient`] - command surface of the transcode farm: global
//!   pause flag, node/worker topology, per-worker cancellation, the
//!   error/cancelled status table, job reports, and job requeueing.
//!
//! [`controller::Controller`] polls the probe on a fixed interval and drives
//! an edge-triggered state machine ([`state`]) that acts exactly once per
//! activity transition, sequencing the [`engine`] passes.

pub mod controller;
pub mod engine;
pub mod error;
pub mod farm;
pub mod playback;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::Controller;
pub use error::ClientError;
pub use state::{ControllerState, Directive};
