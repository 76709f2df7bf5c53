//! # LSB Steganography Core
//!
//! Bit-level reading and writing of payloads hidden in the low-significance
//! bits of pixel samples, plus bit-plane isolation for visual probing.
//!
//! ## Modules
//!
//! - [`grid`]: the dense pixel-sample grid all decoding operates on
//! - [`bitplane`]: single-bit-significance image derivation
//! - [`reader`]: cursor-based bit-stream reader and payload decoder
//! - [`writer`]: the matching encoder (same traversal, same wire format)
//! - [`error`]: typed failures for malformed or absent payloads

pub mod bitplane;
pub mod error;
pub mod grid;
pub mod reader;
pub mod writer;

pub use error::StegoError;
pub use grid::PixelGrid;
pub use reader::{MaskSchedule, StegoBitstreamReader};
pub use writer::StegoBitstreamWriter;
