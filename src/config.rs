//! # Scanner Configuration
//!
//! All tunables come in once, explicitly, through a TOML file parsed at
//! process start — never through ambient process-wide state. Every field has
//! a default so the binary runs without a file at all.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::scan::pipeline::{PipelineConfig, ScanStrategy};
use crate::scan::scheduler::ProbePolicy;
use crate::stego::MaskSchedule;

/// Load a TOML configuration file and deserialize it into the given type.
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Which per-frame interrogation the workers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Probe derived bit-plane images with the symbol decoder.
    PlaneProbe,
    /// Reconstruct a nested image payload from the bit stream first.
    PayloadExtract,
}

/// `[scan]` section: what to look for and how hard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub strategy: StrategyKind,
    /// Probe policy for the plane-probe strategy.
    pub policy: ProbePolicy,
    /// Highest bit plane swept by the plane-probe strategy (0..=7).
    pub max_plane: u8,
    /// Mask schedule for the payload-extract strategy.
    pub schedule: MaskSchedule,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::PlaneProbe,
            policy: ProbePolicy::FirstHit,
            max_plane: 7,
            schedule: MaskSchedule::Progressive,
        }
    }
}

/// `[pipeline]` section: queueing and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub queue_capacity: usize,
    pub workers: usize,
    pub decode_timeout_secs: u64,
    pub cooldown_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 1,
            workers: 1,
            decode_timeout_secs: 10,
            cooldown_secs: 2,
        }
    }
}

/// Complete scanner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub scan: ScanSettings,
    pub pipeline: PipelineSettings,
}

impl ScannerConfig {
    /// Load scanner configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        load_config(path)
    }

    /// Translate the file-level settings into a runtime pipeline config.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let strategy = match self.scan.strategy {
            StrategyKind::PlaneProbe => ScanStrategy::PlaneProbe {
                max_plane: self.scan.max_plane.min(7),
                policy: self.scan.policy,
            },
            StrategyKind::PayloadExtract => ScanStrategy::PayloadExtract {
                schedule: self.scan.schedule,
            },
        };
        PipelineConfig {
            queue_capacity: self.pipeline.queue_capacity,
            workers: self.pipeline.workers,
            decode_timeout: Duration::from_secs(self.pipeline.decode_timeout_secs),
            cooldown: Duration::from_secs(self.pipeline.cooldown_secs),
            strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_every_field() {
        let config: ScannerConfig = toml::from_str("").unwrap();
        assert_eq!(config.scan.max_plane, 7);
        assert_eq!(config.pipeline.queue_capacity, 1);
        assert_eq!(config.pipeline.cooldown_secs, 2);
    }

    #[test]
    fn parses_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[scan]\nstrategy = \"payload-extract\"\nschedule = \"fixed\"\n\n\
             [pipeline]\ndecode_timeout_secs = 3"
        )
        .unwrap();
        let config = ScannerConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.scan.strategy, StrategyKind::PayloadExtract);
        assert_eq!(config.scan.schedule, MaskSchedule::Fixed);
        assert_eq!(config.pipeline.decode_timeout_secs, 3);
        // Untouched sections keep their defaults.
        assert_eq!(config.pipeline.workers, 1);
    }
}
