//! # Frame Pipeline
//!
//! Producer/consumer plumbing that keeps a capture loop responsive while
//! decoding runs in the background.
//!
//! ## Queue discipline
//!
//! - Capture to worker: bounded channel (capacity 1 by default for lowest
//!   latency). The producer enqueues without blocking and the *new* frame is
//!   dropped when the queue is full — frame dropping, not throttled capture,
//!   is the backpressure mechanism, because exhaustive decode cost can exceed
//!   the frame interval by a wide margin.
//! - Worker to consumer: unbounded. The consumer side applies a cooldown
//!   window so a payload identical to the most recently surfaced one is not
//!   re-announced every frame while it sits in front of the camera.
//!
//! ## Shutdown
//!
//! Workers observe a shared stop signal at the top of each fetch and exit
//! promptly on [`FramePipeline::abort`]; [`FramePipeline::shutdown`] instead
//! closes the frame channel and lets workers drain what is already queued.
//! Cancellation is cooperative per frame — an in-flight decode attempt is
//! never interrupted mid-bit-read, only bounded by the timeout guard.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::capture::Frame;
use crate::decode::SymbolDecoder;
use crate::scan::scheduler::{Detection, ExtractionScheduler, ProbePolicy, CHANNEL_ALL};
use crate::scan::timeout::run_bounded;
use crate::scan::ScanError;
use crate::stego::{MaskSchedule, PixelGrid, StegoBitstreamReader, StegoError};

/// How a worker interrogates each frame.
#[derive(Debug, Clone, Copy)]
pub enum ScanStrategy {
    /// Sweep (bit-plane, channel) combinations and probe each derived image
    /// with the symbol decoder directly.
    PlaneProbe { max_plane: u8, policy: ProbePolicy },
    /// Reconstruct a length-prefixed payload from the bit stream; the payload
    /// is itself an encoded image, which is then probed for symbols.
    PayloadExtract { schedule: MaskSchedule },
}

/// Runtime knobs for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Capture-to-worker queue bound. 1 keeps at most one frame in flight.
    pub queue_capacity: usize,
    /// Number of decode workers.
    pub workers: usize,
    /// Wall-clock budget per frame decode attempt.
    pub decode_timeout: Duration,
    /// Minimum gap before an identical detection is surfaced again.
    pub cooldown: Duration,
    pub strategy: ScanStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1,
            workers: 1,
            decode_timeout: Duration::from_secs(10),
            cooldown: Duration::from_secs(2),
            strategy: ScanStrategy::PlaneProbe {
                max_plane: 7,
                policy: ProbePolicy::FirstHit,
            },
        }
    }
}

/// Handle owned by the capture side: feeds frames in, controls shutdown.
pub struct FramePipeline {
    frame_tx: mpsc::Sender<Frame>,
    stop_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl FramePipeline {
    /// Start the workers and hand back the feeding handle plus the
    /// cooldown-filtered detection stream.
    pub fn spawn(
        config: PipelineConfig,
        decoder: Arc<dyn SymbolDecoder>,
    ) -> (FramePipeline, DetectionStream) {
        let (frame_tx, frame_rx) = mpsc::channel(config.queue_capacity.max(1));
        let frame_rx = Arc::new(Mutex::new(frame_rx));
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let mut workers = Vec::new();
        for worker_id in 0..config.workers.max(1) {
            workers.push(tokio::spawn(worker_loop(
                worker_id,
                frame_rx.clone(),
                result_tx.clone(),
                stop_rx.clone(),
                config.strategy,
                config.decode_timeout,
                decoder.clone(),
            )));
        }

        let pipeline = FramePipeline {
            frame_tx,
            stop_tx,
            workers,
        };
        let stream = DetectionStream {
            rx: result_rx,
            gate: CooldownGate::new(config.cooldown),
        };
        (pipeline, stream)
    }

    /// Non-blocking enqueue for live capture loops. Returns `false` when the
    /// frame was dropped because the queue is full (or the workers are gone);
    /// the producer is never blocked.
    pub fn offer(&self, frame: Frame) -> bool {
        match self.frame_tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("frame queue full, dropping frame");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("frame queue closed, dropping frame");
                false
            }
        }
    }

    /// Waiting enqueue for static sources where every frame must be
    /// processed (file scans). Not for live capture — use [`Self::offer`]
    /// there so the camera loop never stalls.
    pub async fn feed(&self, frame: Frame) -> bool {
        self.frame_tx.send(frame).await.is_ok()
    }

    /// Graceful shutdown: close the frame channel, let workers drain what is
    /// already queued, then wait for them to exit.
    pub async fn shutdown(self) {
        drop(self.frame_tx);
        join_workers(self.workers).await;
    }

    /// Prompt shutdown: flip the stop signal so workers exit at their next
    /// fetch without draining the queue.
    pub async fn abort(self) {
        let _ = self.stop_tx.send(true);
        drop(self.frame_tx);
        join_workers(self.workers).await;
    }
}

async fn join_workers(workers: Vec<JoinHandle<()>>) {
    for (worker_id, handle) in workers.into_iter().enumerate() {
        if let Err(e) = handle.await {
            error!("worker {} did not exit cleanly: {}", worker_id, e);
        }
    }
}

enum Fetch {
    Frame(Frame),
    Stop,
}

async fn worker_loop(
    worker_id: usize,
    frames: Arc<Mutex<mpsc::Receiver<Frame>>>,
    results: mpsc::UnboundedSender<Detection>,
    mut stop: watch::Receiver<bool>,
    strategy: ScanStrategy,
    decode_timeout: Duration,
    decoder: Arc<dyn SymbolDecoder>,
) {
    info!("🔍 Decode worker {} started", worker_id);
    loop {
        // Fetch: blocking bounded wait, stop signal checked first.
        let fetched = {
            let mut rx = frames.lock().await;
            tokio::select! {
                // Biased so a pending stop always wins over a queued frame.
                biased;
                // A closed stop channel means the pipeline handle is gone.
                _ = stop.changed() => Fetch::Stop,
                frame = rx.recv() => match frame {
                    Some(frame) => Fetch::Frame(frame),
                    None => Fetch::Stop,
                },
            }
        };
        let frame = match fetched {
            Fetch::Frame(frame) => frame,
            Fetch::Stop => break,
        };

        process_frame(
            worker_id,
            frame,
            strategy,
            decode_timeout,
            decoder.clone(),
            &results,
        )
        .await;
    }
    info!("🔍 Decode worker {} stopped", worker_id);
}

/// Extract + decode + publish for a single frame. Every failure is absorbed
/// here; nothing propagates to the capture loop.
async fn process_frame(
    worker_id: usize,
    frame: Frame,
    strategy: ScanStrategy,
    decode_timeout: Duration,
    decoder: Arc<dyn SymbolDecoder>,
    results: &mpsc::UnboundedSender<Detection>,
) {
    let started = Instant::now();
    let image = frame.image;

    let outcome = match strategy {
        ScanStrategy::PlaneProbe { max_plane, policy } => {
            let scheduler = ExtractionScheduler::new(max_plane, policy);
            run_bounded(
                move || Ok(scheduler.scan(&image, decoder.as_ref())),
                decode_timeout,
            )
            .await
        }
        ScanStrategy::PayloadExtract { schedule } => {
            run_bounded(
                move || {
                    let mut reader = StegoBitstreamReader::new(&image, schedule);
                    let payload = reader.decode_payload()?;
                    Ok(decode_nested_image(&payload, decoder.as_ref()))
                },
                decode_timeout,
            )
            .await
        }
    };

    match outcome {
        Ok(hits) if hits.is_empty() => {
            // Expected, frequent, and not an alarm.
            debug!(
                "Worker {}: no hidden payload in frame ({:?})",
                worker_id,
                started.elapsed()
            );
        }
        Ok(hits) => {
            info!(
                "✅ Worker {} found {} detection(s) in {:?}",
                worker_id,
                hits.len(),
                started.elapsed()
            );
            for hit in hits {
                if results.send(hit).is_err() {
                    debug!("Worker {}: result consumer gone", worker_id);
                    return;
                }
            }
        }
        Err(ScanError::DecodeTimeout { limit }) => {
            warn!(
                "⏱️  Worker {} skipped frame: decode exceeded {:?}",
                worker_id, limit
            );
        }
        // Logged apart from plain exhaustion: a length field that overruns
        // capacity usually means an encoder mismatch, not an empty frame.
        Err(ScanError::Stego(e @ StegoError::MalformedLength { .. })) => {
            warn!("Worker {}: {}", worker_id, e);
        }
        Err(ScanError::Stego(e)) => {
            debug!("Worker {}: {}", worker_id, e);
        }
        Err(e) => {
            error!("❌ Worker {}: {}", worker_id, e);
        }
    }
}

/// The nested-image variants embed a whole encoded image as the payload;
/// decode it and probe it for symbols. A payload that is not a decodable
/// image is treated as "nothing found".
fn decode_nested_image(payload: &[u8], decoder: &dyn SymbolDecoder) -> Vec<Detection> {
    match image::load_from_memory(payload) {
        Ok(inner) => decoder
            .decode_symbols(&PixelGrid::from_dynamic(&inner))
            .into_iter()
            .filter(|text| !text.is_empty())
            .map(|text| Detection {
                text,
                plane: 0,
                channel: CHANNEL_ALL,
            })
            .collect(),
        Err(e) => {
            debug!("recovered payload is not a decodable image: {}", e);
            Vec::new()
        }
    }
}

/// Suppresses identical detections inside the cooldown window.
struct CooldownGate {
    window: Duration,
    last_surfaced: Option<(String, Instant)>,
}

impl CooldownGate {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last_surfaced: None,
        }
    }

    /// Decide whether a detection at `now` may be surfaced; admitting one
    /// restarts the window for its text.
    fn admit(&mut self, text: &str, now: Instant) -> bool {
        if let Some((last_text, at)) = &self.last_surfaced {
            if last_text == text && now.duration_since(*at) < self.window {
                return false;
            }
        }
        self.last_surfaced = Some((text.to_owned(), now));
        true
    }
}

/// Consumer end of the pipeline: detections with the cooldown applied.
/// Suppressed repeats are still logged, just not surfaced.
pub struct DetectionStream {
    rx: mpsc::UnboundedReceiver<Detection>,
    gate: CooldownGate,
}

impl DetectionStream {
    /// Next surfaced detection, or `None` once all workers have exited.
    pub async fn next(&mut self) -> Option<Detection> {
        while let Some(detection) = self.rx.recv().await {
            if self.gate.admit(&detection.text, Instant::now()) {
                return Some(detection);
            }
            debug!(
                "🔁 Suppressed repeat detection inside cooldown: {}",
                detection.text
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_suppresses_identical_detections_inside_window() {
        let mut gate = CooldownGate::new(Duration::from_secs(2));
        let t0 = Instant::now();
        assert!(gate.admit("payload", t0));
        assert!(!gate.admit("payload", t0 + Duration::from_secs(1)));
        assert!(gate.admit("payload", t0 + Duration::from_secs(3)));
    }

    #[test]
    fn cooldown_lets_different_payloads_through() {
        let mut gate = CooldownGate::new(Duration::from_secs(2));
        let t0 = Instant::now();
        assert!(gate.admit("a", t0));
        assert!(gate.admit("b", t0 + Duration::from_millis(10)));
    }

    #[test]
    fn admitting_restarts_the_window() {
        let mut gate = CooldownGate::new(Duration::from_secs(2));
        let t0 = Instant::now();
        assert!(gate.admit("a", t0));
        assert!(gate.admit("a", t0 + Duration::from_secs(3)));
        // Window is measured from the re-surfaced detection, not the first.
        assert!(!gate.admit("a", t0 + Duration::from_secs(4)));
    }
}
