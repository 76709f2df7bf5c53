//! # Real-Time Extraction Pipeline
//!
//! Everything between a captured frame and a surfaced detection:
//!
//! - [`scheduler`]: enumerates (bit-plane, channel) probes over a frame
//! - [`timeout`]: bounds the worst-case cost of one decode attempt
//! - [`pipeline`]: bounded frame queue, background workers, result cooldown

pub mod pipeline;
pub mod scheduler;
pub mod timeout;

use std::time::Duration;

use crate::stego::StegoError;

pub use pipeline::{DetectionStream, FramePipeline, PipelineConfig, ScanStrategy};
pub use scheduler::{Detection, ExtractionScheduler, ProbePolicy, CHANNEL_ALL};

/// Per-frame decode failures. All of these are absorbed at the worker
/// boundary; none escapes to the capture loop.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The bounded decode did not finish in time. The frame is skipped and
    /// the detached attempt is left to finish in the background.
    #[error("decode attempt exceeded its {limit:?} budget")]
    DecodeTimeout { limit: Duration },

    /// The bit stream held no valid payload under the active schedule.
    #[error(transparent)]
    Stego(#[from] StegoError),

    /// The blocking decode task failed to rejoin (panic in the decode
    /// closure, or runtime shutdown underneath it).
    #[error("decode worker failed: {0}")]
    DecodeWorker(String),
}
