//! # Bit-Plane Extraction
//!
//! Derives a single-bit-significance image from a source image: every output
//! sample is 255 where the chosen bit is set and 0 where it is clear. The
//! result is both a human-viewable visualization of a candidate plane and the
//! input the symbol decoder probes for hidden QR codes.

use crate::stego::grid::PixelGrid;

/// Isolate one bit of significance from every sample of `image`.
///
/// Each output sample is `((sample >> plane) & 1) * 255`. Pure, no side
/// effects; the source image is left untouched.
///
/// # Panics
/// Panics if `plane > 7`.
pub fn extract(image: &PixelGrid, plane: u8) -> PixelGrid {
    assert!(plane <= 7, "bit plane index must be in 0..=7");
    let samples = image
        .samples()
        .iter()
        .map(|s| ((s >> plane) & 1) * 255)
        .collect();
    PixelGrid::new(image.height(), image.width(), image.channels(), samples)
}
