//! # Capture Boundary
//!
//! The pipeline has no opinion on where frames come from: anything that can
//! produce `(ok, frame)` pairs sits behind [`VideoSource`]. End of stream or
//! a device error is signalled by `None`, which ends the capture loop but
//! never the process — pipeline shutdown still runs and drains the workers.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use log::{error, info};

use crate::stego::grid::PixelGrid;

/// A captured image plus its capture timestamp. Ephemeral: owned by the
/// queue slot that holds it, discarded once processed or dropped.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: PixelGrid,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(image: PixelGrid) -> Self {
        Self {
            image,
            captured_at: Instant::now(),
        }
    }
}

/// Frame producer collaborator. `None` means end of stream or capture
/// failure; the source is done either way.
pub trait VideoSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

/// A static "stream" over image files on disk, one frame per file. Files
/// that fail to decode are logged and skipped, matching the per-frame
/// absorption policy of the rest of the pipeline.
pub struct FileSource {
    paths: VecDeque<PathBuf>,
}

impl FileSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }
}

impl VideoSource for FileSource {
    fn next_frame(&mut self) -> Option<Frame> {
        while let Some(path) = self.paths.pop_front() {
            match image::open(&path) {
                Ok(decoded) => {
                    info!("📷 Loaded frame from {}", path.display());
                    return Some(Frame::new(PixelGrid::from_dynamic(&decoded)));
                }
                Err(e) => {
                    error!("❌ Skipping {}: {}", path.display(), e);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_ends_cleanly_when_exhausted() {
        let mut source = FileSource::new(Vec::new());
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn file_source_skips_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("not_an_image.png");
        std::fs::write(&bogus, b"definitely not a png").unwrap();

        let good = dir.path().join("good.png");
        image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]))
            .save(&good)
            .unwrap();

        let mut source = FileSource::new(vec![bogus, good]);
        let frame = source.next_frame().expect("good file must yield a frame");
        assert_eq!(frame.image.channels(), 3);
        assert_eq!(frame.image.sample(0, 0, 2), 3);
        assert!(source.next_frame().is_none());
    }
}
