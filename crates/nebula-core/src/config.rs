#![forbid(unsafe_code)]

//! Render configuration.
//!
//! [`Config`] is produced once at startup by the orchestrator. The compute
//! path assumes every field is already inside its supported range; the
//! orchestrator guarantees that by calling [`Config::clamp_to_valid_ranges`]
//! after parsing user input.

use std::fmt;
use std::str::FromStr;

/// Work-distribution policy for the per-frame tile loop.
///
/// The policy only changes which worker computes which tile and in what
/// order. The produced pixels are identical for every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchedulePolicy {
    /// Contiguous, equally sized blocks of tiles per worker.
    #[default]
    Static,
    /// Workers repeatedly grab `chunk` tiles from a shared queue.
    Dynamic,
    /// Large grabs first, shrinking towards `chunk` tiles.
    Guided,
    /// Let the runtime decide.
    Auto,
}

impl SchedulePolicy {
    pub const ALL: [Self; 4] = [Self::Static, Self::Dynamic, Self::Guided, Self::Auto];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Guided => "guided",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for SchedulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownSchedule(s.to_string()))
    }
}

/// Color source for the shade-to-color step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Palette {
    /// Blend between two base colors derived from the seed.
    #[default]
    Seeded,
    /// Deep blue -> violet -> magenta -> warm gold.
    Nebula,
    /// Dark red -> orange -> pale yellow.
    Inferno,
    /// Teal -> cyan -> icy white.
    Ice,
    /// Grayscale.
    Bw,
}

impl Palette {
    pub const ALL: [Self; 5] = [Self::Seeded, Self::Nebula, Self::Inferno, Self::Ice, Self::Bw];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::Nebula => "nebula",
            Self::Inferno => "inferno",
            Self::Ice => "ice",
            Self::Bw => "bw",
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Palette {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownPalette(s.to_string()))
    }
}

/// Errors raised while turning user input into a [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownSchedule(String),
    UnknownPalette(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSchedule(name) => write!(
                f,
                "unknown schedule '{name}' (expected static|dynamic|guided|auto)"
            ),
            Self::UnknownPalette(name) => write!(
                f,
                "unknown palette '{name}' (expected seeded|nebula|inferno|ice|bw)"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// One field that [`Config::clamp_to_valid_ranges`] had to change.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigAdjustment {
    pub field: &'static str,
    pub from: String,
    pub to: String,
}

impl fmt::Display for ConfigAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.from, self.to)
    }
}

/// Render configuration consumed by the noise field and the frame scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// fBm octave count.
    pub octaves: u32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f32,
    /// Amplitude multiplier between octaves.
    pub persistence: f32,
    /// Seconds-to-depth scale for the animated z axis.
    pub zspeed: f32,
    pub seed: u32,
    /// Internal resolution factor; below 1.0 the frame is rendered small and upscaled.
    pub render_scale: f32,
    pub schedule: SchedulePolicy,
    /// Work chunk: tile edge hint and tiles per grab for chunked policies.
    pub chunk: u32,
    /// Worker count for parallel dispatch; 0 means one per available core.
    pub threads: usize,
    pub palette: Palette,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            octaves: 8,
            lacunarity: 2.0,
            persistence: 0.5,
            zspeed: 0.15,
            seed: 0,
            render_scale: 1.0,
            schedule: SchedulePolicy::Static,
            chunk: 32,
            threads: 0,
            palette: Palette::Seeded,
        }
    }
}

pub const MIN_WIDTH: u32 = 160;
pub const MIN_HEIGHT: u32 = 120;
pub const OCTAVES_RANGE: (u32, u32) = (1, 12);
pub const LACUNARITY_RANGE: (f32, f32) = (1.5, 3.0);
pub const PERSISTENCE_RANGE: (f32, f32) = (0.05, 0.95);
pub const ZSPEED_RANGE: (f32, f32) = (0.0, 5.0);
pub const RENDER_SCALE_RANGE: (f32, f32) = (0.3, 1.0);
pub const CHUNK_RANGE: (u32, u32) = (1, 512);

impl Config {
    /// Pull every field into its supported range.
    ///
    /// Non-finite floats fall back to the default value. Returns one entry per
    /// field that changed so the caller can report them.
    pub fn clamp_to_valid_ranges(&mut self) -> Vec<ConfigAdjustment> {
        let defaults = Self::default();
        let mut adjustments = Vec::new();

        clamp_u32(&mut self.width, MIN_WIDTH, u32::MAX, "width", &mut adjustments);
        clamp_u32(&mut self.height, MIN_HEIGHT, u32::MAX, "height", &mut adjustments);
        clamp_u32(
            &mut self.octaves,
            OCTAVES_RANGE.0,
            OCTAVES_RANGE.1,
            "octaves",
            &mut adjustments,
        );
        clamp_f32(
            &mut self.lacunarity,
            LACUNARITY_RANGE,
            defaults.lacunarity,
            "lacunarity",
            &mut adjustments,
        );
        clamp_f32(
            &mut self.persistence,
            PERSISTENCE_RANGE,
            defaults.persistence,
            "persistence",
            &mut adjustments,
        );
        clamp_f32(
            &mut self.zspeed,
            ZSPEED_RANGE,
            defaults.zspeed,
            "zspeed",
            &mut adjustments,
        );
        clamp_f32(
            &mut self.render_scale,
            RENDER_SCALE_RANGE,
            defaults.render_scale,
            "render_scale",
            &mut adjustments,
        );
        clamp_u32(
            &mut self.chunk,
            CHUNK_RANGE.0,
            CHUNK_RANGE.1,
            "chunk",
            &mut adjustments,
        );

        adjustments
    }

    /// Total pixel count of the output frame.
    #[inline]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether frames take the reduced-resolution path.
    #[inline]
    pub fn is_low_res(&self) -> bool {
        self.render_scale < FULL_RES_THRESHOLD
    }
}

/// Render scales at or above this value render at full resolution.
pub const FULL_RES_THRESHOLD: f32 = 0.999;

fn clamp_u32(
    value: &mut u32,
    lo: u32,
    hi: u32,
    field: &'static str,
    adjustments: &mut Vec<ConfigAdjustment>,
) {
    let clamped = (*value).clamp(lo, hi);
    if clamped != *value {
        adjustments.push(ConfigAdjustment {
            field,
            from: value.to_string(),
            to: clamped.to_string(),
        });
        *value = clamped;
    }
}

fn clamp_f32(
    value: &mut f32,
    (lo, hi): (f32, f32),
    fallback: f32,
    field: &'static str,
    adjustments: &mut Vec<ConfigAdjustment>,
) {
    let clamped = if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    };
    if clamped.to_bits() != value.to_bits() {
        adjustments.push(ConfigAdjustment {
            field,
            from: value.to_string(),
            to: clamped.to_string(),
        });
        *value = clamped;
    }
}
