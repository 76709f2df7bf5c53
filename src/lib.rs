//! # stegscan
//!
//! Detects payloads hidden in the least-significant bits of an image
//! stream's pixel channels. The core is a cursor-based bit-stream codec, a
//! (bit-plane, channel) probe scheduler, a timeout guard that bounds
//! worst-case decode cost, and a drop-on-full frame pipeline that keeps a
//! capture loop responsive while decoding runs in the background.

pub mod capture;
pub mod config;
pub mod decode;
pub mod scan;
pub mod stego;

pub use capture::{FileSource, Frame, VideoSource};
pub use config::ScannerConfig;
pub use decode::{QrDecoder, SymbolDecoder};
pub use scan::{Detection, DetectionStream, FramePipeline, PipelineConfig, ScanStrategy};
pub use stego::PixelGrid;
