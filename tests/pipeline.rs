//! End-to-end tests for the frame pipeline: backpressure, cooldown,
//! shutdown, and the nested-image payload path.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use stegscan::capture::Frame;
use stegscan::decode::SymbolDecoder;
use stegscan::scan::scheduler::ProbePolicy;
use stegscan::scan::{FramePipeline, PipelineConfig, ScanStrategy};
use stegscan::stego::{MaskSchedule, PixelGrid, StegoBitstreamWriter};

/// Decoder that claims to find the same symbol in every image.
struct AlwaysDecoder(&'static str);

impl SymbolDecoder for AlwaysDecoder {
    fn decode_symbols(&self, _image: &PixelGrid) -> Vec<String> {
        vec![self.0.to_string()]
    }
}

/// Decoder that only recognizes sample buffers it has been taught.
struct MapDecoder(HashMap<Vec<u8>, String>);

impl SymbolDecoder for MapDecoder {
    fn decode_symbols(&self, image: &PixelGrid) -> Vec<String> {
        self.0
            .get(image.samples())
            .cloned()
            .map(|t| vec![t])
            .unwrap_or_default()
    }
}

fn blank_frame() -> Frame {
    Frame::new(PixelGrid::zeroed(4, 4, 3))
}

fn probe_config(cooldown: Duration) -> PipelineConfig {
    PipelineConfig {
        queue_capacity: 1,
        workers: 1,
        decode_timeout: Duration::from_secs(5),
        cooldown,
        strategy: ScanStrategy::PlaneProbe {
            max_plane: 0,
            policy: ProbePolicy::FirstHit,
        },
    }
}

#[tokio::test]
async fn producer_never_blocks_and_queue_stays_bounded() {
    let (pipeline, _detections) =
        FramePipeline::spawn(probe_config(Duration::ZERO), Arc::new(AlwaysDecoder("x")));

    // On a current-thread runtime the worker has not run yet, so these
    // enqueues race nothing: capacity 1 admits exactly one frame.
    let started = Instant::now();
    let accepted: Vec<bool> = (0..3).map(|_| pipeline.offer(blank_frame())).collect();
    assert!(
        started.elapsed() < Duration::from_millis(100),
        "offer must never block the producer"
    );
    assert_eq!(accepted, vec![true, false, false]);

    pipeline.shutdown().await;
}

#[tokio::test]
async fn identical_detections_inside_cooldown_surface_once() {
    let (pipeline, mut detections) = FramePipeline::spawn(
        probe_config(Duration::from_secs(2)),
        Arc::new(AlwaysDecoder("repeat")),
    );

    // Both frames decode to the same text well inside the window.
    assert!(pipeline.feed(blank_frame()).await);
    assert!(pipeline.feed(blank_frame()).await);
    pipeline.shutdown().await;

    let mut surfaced = Vec::new();
    while let Some(hit) = detections.next().await {
        surfaced.push(hit);
    }
    assert_eq!(surfaced.len(), 1);
    assert_eq!(surfaced[0].text, "repeat");
}

#[tokio::test]
async fn distinct_detections_pass_the_cooldown() {
    // Zero-width window: nothing is ever suppressed.
    let (pipeline, mut detections) = FramePipeline::spawn(
        probe_config(Duration::ZERO),
        Arc::new(AlwaysDecoder("hit")),
    );

    assert!(pipeline.feed(blank_frame()).await);
    assert!(pipeline.feed(blank_frame()).await);
    pipeline.shutdown().await;

    let mut count = 0;
    while detections.next().await.is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
}

#[tokio::test]
async fn recovers_nested_image_payload_from_bit_stream() {
    // The hidden payload is itself a PNG; the pipeline must reconstruct it
    // from the carrier's LSBs, decode it, and probe it for symbols.
    let inner = image::RgbImage::from_fn(4, 4, |x, y| image::Rgb([x as u8, y as u8, 0xA5]));
    let mut png = Vec::new();
    inner
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let mut carrier = PixelGrid::zeroed(48, 48, 3);
    StegoBitstreamWriter::new(&mut carrier, MaskSchedule::Fixed)
        .encode_payload(&png)
        .unwrap();

    let mut known = HashMap::new();
    known.insert(inner.as_raw().clone(), "hidden".to_string());

    let config = PipelineConfig {
        queue_capacity: 1,
        workers: 1,
        decode_timeout: Duration::from_secs(5),
        cooldown: Duration::from_secs(2),
        strategy: ScanStrategy::PayloadExtract {
            schedule: MaskSchedule::Fixed,
        },
    };
    let (pipeline, mut detections) = FramePipeline::spawn(config, Arc::new(MapDecoder(known)));

    assert!(pipeline.feed(Frame::new(carrier)).await);
    pipeline.shutdown().await;

    let hit = detections.next().await.expect("payload must be recovered");
    assert_eq!(hit.text, "hidden");
    assert_eq!(hit.plane, 0);
    assert_eq!(hit.channel, stegscan::scan::CHANNEL_ALL);
    assert!(detections.next().await.is_none());
}

#[tokio::test]
async fn clean_frames_surface_nothing() {
    // Absence of a payload is silent: the stream just ends at shutdown.
    let config = PipelineConfig {
        strategy: ScanStrategy::PayloadExtract {
            schedule: MaskSchedule::Fixed,
        },
        ..probe_config(Duration::from_secs(2))
    };
    let (pipeline, mut detections) = FramePipeline::spawn(
        config,
        Arc::new(MapDecoder(HashMap::new())),
    );

    assert!(pipeline.feed(blank_frame()).await);
    pipeline.shutdown().await;
    assert!(detections.next().await.is_none());
}

#[tokio::test]
async fn abort_stops_workers_without_draining() {
    let (pipeline, mut detections) =
        FramePipeline::spawn(probe_config(Duration::ZERO), Arc::new(AlwaysDecoder("x")));

    // Queue a frame but abort before yielding to the worker.
    pipeline.offer(blank_frame());
    tokio::time::timeout(Duration::from_secs(1), pipeline.abort())
        .await
        .expect("abort must complete promptly");
    assert!(detections.next().await.is_none());
}
