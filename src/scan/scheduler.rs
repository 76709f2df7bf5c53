//! # Extraction Scheduler
//!
//! Enumerates probe attempts over a frame in a fixed, deterministic order:
//! bit planes ascending; within each plane every channel ascending, then all
//! channels combined. Each probe derives the plane image and hands it to the
//! symbol-decode collaborator. The order is part of the contract: first-hit
//! results are deterministic, and exhaustive results come back sorted by
//! probe order regardless of how long individual probes take.

use serde::{Deserialize, Serialize};

use crate::decode::SymbolDecoder;
use crate::stego::bitplane;
use crate::stego::grid::PixelGrid;

/// Channel sentinel for "all channels combined".
pub const CHANNEL_ALL: i8 = -1;

/// Whether a sweep stops at the first hit or collects every one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbePolicy {
    /// Return immediately on the first successful decode.
    FirstHit,
    /// Run all probes and return the ordered list of hits; used when several
    /// independent payloads may coexist across planes and channels.
    Exhaustive,
}

/// One surfaced hit: the decoded text plus where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub text: String,
    pub plane: u8,
    /// Channel index, or [`CHANNEL_ALL`] for the combined-channel probe.
    pub channel: i8,
}

impl Detection {
    /// Human-readable channel label for logs and presentation.
    pub fn channel_label(&self) -> String {
        if self.channel == CHANNEL_ALL {
            "all".to_string()
        } else {
            self.channel.to_string()
        }
    }
}

/// Sweeps (bit-plane, channel) combinations over one frame.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionScheduler {
    max_plane: u8,
    policy: ProbePolicy,
}

impl ExtractionScheduler {
    /// # Panics
    /// Panics if `max_plane > 7`.
    pub fn new(max_plane: u8, policy: ProbePolicy) -> Self {
        assert!(max_plane <= 7, "bit plane index must be in 0..=7");
        Self { max_plane, policy }
    }

    /// Run the sweep. A probe succeeds when the decoder returns at least one
    /// non-empty symbol; only the first symbol of a probe is surfaced.
    pub fn scan(&self, image: &PixelGrid, decoder: &dyn SymbolDecoder) -> Vec<Detection> {
        let mut hits = Vec::new();
        for plane in 0..=self.max_plane {
            let plane_image = bitplane::extract(image, plane);

            for channel in 0..image.channels() {
                let probe = plane_image.channel_plane(channel);
                if let Some(text) = first_symbol(decoder, &probe) {
                    hits.push(Detection {
                        text,
                        plane,
                        channel: channel as i8,
                    });
                    if self.policy == ProbePolicy::FirstHit {
                        return hits;
                    }
                }
            }

            if let Some(text) = first_symbol(decoder, &plane_image) {
                hits.push(Detection {
                    text,
                    plane,
                    channel: CHANNEL_ALL,
                });
                if self.policy == ProbePolicy::FirstHit {
                    return hits;
                }
            }
        }
        hits
    }
}

fn first_symbol(decoder: &dyn SymbolDecoder, image: &PixelGrid) -> Option<String> {
    decoder
        .decode_symbols(image)
        .into_iter()
        .find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Fake collaborator that "decodes" only images whose exact sample buffer
    /// it has been taught, mapping each to a fixed text.
    struct MapDecoder {
        known: HashMap<Vec<u8>, String>,
    }

    impl SymbolDecoder for MapDecoder {
        fn decode_symbols(&self, image: &PixelGrid) -> Vec<String> {
            self.known
                .get(image.samples())
                .cloned()
                .map(|t| vec![t])
                .unwrap_or_default()
        }
    }

    /// 2x2x3 frame with hits at plane 2 / channel 1 and plane 5 / combined.
    fn rigged_frame() -> (PixelGrid, MapDecoder) {
        let mut frame = PixelGrid::zeroed(2, 2, 3);
        // Plane 2 marker on channel 1 of pixel (0, 0).
        frame.set_sample(0, 0, 1, 1 << 2);
        // Plane 5 marker on every channel of pixel (1, 1): decodable only
        // when the three channels are viewed together.
        for c in 0..3 {
            let prev = frame.sample(1, 1, c);
            frame.set_sample(1, 1, c, prev | 1 << 5);
        }

        let mut known = HashMap::new();
        known.insert(
            bitplane::extract(&frame, 2).channel_plane(1).samples().to_vec(),
            "first".to_string(),
        );
        known.insert(
            bitplane::extract(&frame, 5).samples().to_vec(),
            "second".to_string(),
        );
        (frame, MapDecoder { known })
    }

    #[test]
    fn exhaustive_hits_come_back_in_probe_order() {
        let (frame, decoder) = rigged_frame();
        let hits = ExtractionScheduler::new(7, ProbePolicy::Exhaustive).scan(&frame, &decoder);
        let positions: Vec<(u8, i8)> = hits.iter().map(|d| (d.plane, d.channel)).collect();
        assert_eq!(positions, vec![(2, 1), (5, CHANNEL_ALL)]);
        assert_eq!(hits[0].text, "first");
        assert_eq!(hits[1].text, "second");
    }

    #[test]
    fn first_hit_stops_at_the_earliest_probe() {
        let (frame, decoder) = rigged_frame();
        let hits = ExtractionScheduler::new(7, ProbePolicy::FirstHit).scan(&frame, &decoder);
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].plane, hits[0].channel), (2, 1));
    }

    #[test]
    fn max_plane_limits_the_sweep() {
        let (frame, decoder) = rigged_frame();
        let hits = ExtractionScheduler::new(3, ProbePolicy::Exhaustive).scan(&frame, &decoder);
        assert_eq!(hits.len(), 1, "plane 5 hit must be out of range");
        assert_eq!(hits[0].plane, 2);
    }

    #[test]
    fn clean_frame_yields_no_hits() {
        let frame = PixelGrid::zeroed(2, 2, 3);
        let decoder = MapDecoder {
            known: HashMap::new(),
        };
        let hits = ExtractionScheduler::new(7, ProbePolicy::Exhaustive).scan(&frame, &decoder);
        assert!(hits.is_empty());
    }
}
