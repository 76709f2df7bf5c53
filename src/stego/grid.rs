//! # Pixel Sample Grid
//!
//! The dense `height x width x channels` grid of 8-bit samples that every
//! decode pass operates on. Frames are converted into a [`PixelGrid`] once at
//! the capture boundary; the grid is then treated as immutable for the
//! duration of a pass, so workers never share mutable pixel state.

use image::{DynamicImage, GrayImage, RgbImage};

/// A dense grid of `height x width` pixels, each a fixed-length tuple of
/// `channels` unsigned 8-bit samples, stored row-major with channels
/// interleaved (the same layout the `image` crate buffers use).
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    height: u32,
    width: u32,
    channels: u32,
    samples: Vec<u8>,
}

impl PixelGrid {
    /// Wrap an existing sample buffer.
    ///
    /// # Panics
    /// Panics if the buffer length does not match `height * width * channels`.
    pub fn new(height: u32, width: u32, channels: u32, samples: Vec<u8>) -> Self {
        assert_eq!(
            samples.len(),
            (height as usize) * (width as usize) * (channels as usize),
            "sample buffer does not match grid dimensions"
        );
        Self {
            height,
            width,
            channels,
            samples,
        }
    }

    /// An all-zero grid, mainly useful as a carrier for the writer.
    pub fn zeroed(height: u32, width: u32, channels: u32) -> Self {
        let len = (height as usize) * (width as usize) * (channels as usize);
        Self::new(height, width, channels, vec![0u8; len])
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    fn index(&self, row: u32, col: u32, channel: u32) -> usize {
        debug_assert!(row < self.height && col < self.width && channel < self.channels);
        ((row as usize * self.width as usize + col as usize) * self.channels as usize)
            + channel as usize
    }

    /// Read one sample at `(row, col, channel)`.
    pub fn sample(&self, row: u32, col: u32, channel: u32) -> u8 {
        self.samples[self.index(row, col, channel)]
    }

    pub(crate) fn set_sample(&mut self, row: u32, col: u32, channel: u32, value: u8) {
        let idx = self.index(row, col, channel);
        self.samples[idx] = value;
    }

    /// Number of one-bit slots available in a single traversal pass.
    pub fn bit_capacity(&self) -> u64 {
        self.height as u64 * self.width as u64 * self.channels as u64
    }

    /// Extract a single channel as a one-channel grid.
    pub fn channel_plane(&self, channel: u32) -> PixelGrid {
        assert!(channel < self.channels, "channel index out of range");
        let mut samples = Vec::with_capacity(self.height as usize * self.width as usize);
        for row in 0..self.height {
            for col in 0..self.width {
                samples.push(self.sample(row, col, channel));
            }
        }
        PixelGrid::new(self.height, self.width, 1, samples)
    }

    /// Build a grid from an RGB image buffer.
    pub fn from_rgb(image: &RgbImage) -> Self {
        Self::new(image.height(), image.width(), 3, image.as_raw().clone())
    }

    /// Build a three-channel grid from any decoded image.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgb(&image.to_rgb8())
    }

    /// Collapse to a grayscale image for the symbol-decode collaborator.
    ///
    /// Single-channel grids pass through untouched; multi-channel grids are
    /// averaged, which maps the bit-plane values {0, 255} onto a gray ramp
    /// the decoder's binarizer handles fine.
    pub fn to_luma(&self) -> GrayImage {
        if self.channels == 1 {
            return GrayImage::from_raw(self.width, self.height, self.samples.clone())
                .expect("buffer length checked at construction");
        }
        let mut out = Vec::with_capacity(self.height as usize * self.width as usize);
        for row in 0..self.height {
            for col in 0..self.width {
                let sum: u32 = (0..self.channels)
                    .map(|c| self.sample(row, col, c) as u32)
                    .sum();
                out.push((sum / self.channels) as u8);
            }
        }
        GrayImage::from_raw(self.width, self.height, out)
            .expect("buffer length matches dimensions")
    }
}
