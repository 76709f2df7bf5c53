//! # Symbol-Decode Collaborator
//!
//! The scan pipeline treats barcode-symbol decoding as a pure function from
//! image to zero-or-more text strings, behind the [`SymbolDecoder`] trait.
//! The default implementation wraps the `rqrr` QR decoder; its internal
//! failures are absorbed here and logged, never propagated to the pipeline.

use log::debug;

use crate::stego::grid::PixelGrid;

/// Pure decode boundary: returns every symbol found in the image, empty when
/// none. Implementations must never panic or error out on undecodable input.
pub trait SymbolDecoder: Send + Sync {
    fn decode_symbols(&self, image: &PixelGrid) -> Vec<String>;
}

/// QR decoding via `rqrr`.
#[derive(Debug, Default)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolDecoder for QrDecoder {
    fn decode_symbols(&self, image: &PixelGrid) -> Vec<String> {
        let mut prepared = rqrr::PreparedImage::prepare(image.to_luma());
        let grids = prepared.detect_grids();
        let mut symbols = Vec::new();
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => symbols.push(content),
                // A finder pattern without a readable payload is routine on
                // noisy bit planes; not worth more than a debug line.
                Err(e) => debug!("QR candidate failed to decode: {}", e),
            }
        }
        symbols
    }
}
