use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Directory holding the slide images, displayed in filename order.
    pub slides_path: PathBuf,
    /// Animation ticks per second.
    pub frame_rate: u32,
    /// Canvas color behind slides and for the loading placeholder.
    pub background_color: [u8; 3],
    /// Maximum number of concurrent slide decodes in the loader.
    pub loader_max_concurrent_decodes: usize,
    /// Optional deterministic seed for patch placement and noise.
    pub startup_seed: Option<u64>,
    /// Automatic slide advancement.
    pub auto_advance: AutoAdvanceOptions,
    /// Patch spawning and effect tuning.
    pub patches: PatchOptions,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults
    /// alone. The per-frame hot path never re-checks these.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.frame_rate > 0, "frame-rate must be greater than zero");
        ensure!(
            self.loader_max_concurrent_decodes > 0,
            "loader-max-concurrent-decodes must be greater than zero"
        );
        if self.auto_advance.enabled {
            ensure!(
                self.auto_advance.dwell > Duration::ZERO,
                "auto-advance.dwell must be positive"
            );
        }
        self.patches
            .validate()
            .context("invalid patches configuration")?;
        Ok(self)
    }

    /// Dwell converted to whole animation ticks, when auto-advance is on.
    #[must_use]
    pub fn auto_advance_ticks(&self) -> Option<u64> {
        if !self.auto_advance.enabled {
            return None;
        }
        let ticks = self.auto_advance.dwell.as_secs_f64() * f64::from(self.frame_rate);
        Some((ticks.round() as u64).max(1))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            slides_path: PathBuf::new(),
            frame_rate: 30,
            background_color: [0, 0, 0],
            loader_max_concurrent_decodes: 2,
            startup_seed: None,
            auto_advance: AutoAdvanceOptions::default(),
            patches: PatchOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AutoAdvanceOptions {
    pub enabled: bool,
    /// How long each slide stays before the show advances on its own.
    #[serde(with = "humantime_serde")]
    pub dwell: Duration,
}

impl Default for AutoAdvanceOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            dwell: Duration::from_secs(60),
        }
    }
}

/// Immutable tuning for the patch scheduler and both operators.
///
/// Constructed once at startup and handed to the scheduler by value; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PatchOptions {
    /// Spawn only on ticks where the tick counter is a multiple of this.
    pub interval_ticks: u64,
    /// Inclusive range for the number of patches per spawn event.
    pub min_per_tick: u32,
    pub max_per_tick: u32,
    /// Inclusive range for patch side lengths, in image pixels.
    pub min_size_px: u32,
    pub max_size_px: u32,
    pub decay: DecayOptions,
    pub restore: RestoreOptions,
}

impl PatchOptions {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.interval_ticks > 0,
            "interval-ticks must be greater than zero"
        );
        ensure!(
            self.min_per_tick <= self.max_per_tick,
            "min-per-tick must not exceed max-per-tick"
        );
        ensure!(self.min_size_px > 0, "min-size-px must be greater than zero");
        ensure!(
            self.min_size_px <= self.max_size_px,
            "min-size-px must not exceed max-size-px"
        );
        self.decay.validate()?;
        self.restore.validate()?;
        Ok(())
    }
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            interval_ticks: 120,
            min_per_tick: 1,
            max_per_tick: 3,
            min_size_px: 30,
            max_size_px: 60,
            decay: DecayOptions::default(),
            restore: RestoreOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DecayOptions {
    /// Ticks a patch spends decaying before it flips to restoring.
    pub ticks: u32,
    /// Channel value subtracted at full progress.
    pub darken_max: f32,
    /// Uniform noise amplitude at full progress; 0 disables noise.
    pub noise_max: f32,
}

impl DecayOptions {
    fn validate(&self) -> Result<()> {
        ensure!(self.ticks > 0, "decay.ticks must be greater than zero");
        ensure!(self.darken_max >= 0.0, "decay.darken-max must not be negative");
        ensure!(self.noise_max >= 0.0, "decay.noise-max must not be negative");
        Ok(())
    }
}

impl Default for DecayOptions {
    fn default() -> Self {
        Self {
            ticks: 1250,
            darken_max: 25.0,
            noise_max: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RestoreOptions {
    /// Ticks a patch spends healing before it is removed.
    pub ticks: u32,
    /// Weight of the neighbor-sampled pixel in the repair blend.
    pub neighbor_weight: f32,
    /// Weight of the pristine pixel in the repair blend. The two weights are
    /// raw knobs and deliberately not normalized to sum to 1.
    pub original_weight: f32,
    /// Per-channel multiplicative bias on the neighbor sample; 0 disables.
    pub chroma_drift: f32,
    /// Border darken/lighten ratio left as a visible seam; 0 disables.
    pub seam_strength: f32,
    /// Radius of the horizontal box blur softening pass; 0 disables.
    pub blur_radius: u32,
    /// Constant added to the restore progress before clamping.
    pub blend_bias: f32,
}

impl RestoreOptions {
    fn validate(&self) -> Result<()> {
        ensure!(self.ticks > 0, "restore.ticks must be greater than zero");
        ensure!(
            self.neighbor_weight >= 0.0,
            "restore.neighbor-weight must not be negative"
        );
        ensure!(
            self.original_weight >= 0.0,
            "restore.original-weight must not be negative"
        );
        ensure!(
            self.chroma_drift >= 0.0,
            "restore.chroma-drift must not be negative"
        );
        ensure!(
            (0.0..1.0).contains(&self.seam_strength),
            "restore.seam-strength must lie in [0, 1)"
        );
        Ok(())
    }
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            ticks: 1450,
            neighbor_weight: 0.1,
            original_weight: 0.9,
            chroma_drift: 0.004,
            seam_strength: 0.05,
            blur_radius: 0,
            blend_bias: 0.0,
        }
    }
}
