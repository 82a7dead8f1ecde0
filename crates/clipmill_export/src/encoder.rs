use clipmill_core::types::TimeUs;
use serde::{Deserialize, Serialize};

/// Lowest frame rate the recording loop will run at.
pub const MIN_FPS: u32 = 20;
/// Highest frame rate the recording loop will run at.
pub const MAX_FPS: u32 = 30;

// ---------------------------------------------------------------------------
// ExportConfig
// ---------------------------------------------------------------------------

/// Quality tier; affects the encoder bitrate hint only, never correctness.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Quality {
    Draft,
    #[default]
    Standard,
    High,
}

impl Quality {
    /// Video bitrate hint in bits per second.
    pub fn bitrate_hint(&self) -> u32 {
        match self {
            Quality::Draft => 2_500_000,
            Quality::Standard => 8_000_000,
            Quality::High => 16_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    /// Export-space width; overlay coordinates are stored in this space.
    pub width: u32,
    pub height: u32,
    /// Fixed recording frame rate, clamped to [`MIN_FPS`]..=[`MAX_FPS`].
    pub fps: u32,
    pub quality: Quality,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            quality: Quality::Standard,
        }
    }
}

impl ExportConfig {
    /// Copy with the frame rate clamped into the supported range.
    pub fn sanitized(&self) -> Self {
        Self {
            fps: self.fps.clamp(MIN_FPS, MAX_FPS),
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// ExportProgress
// ---------------------------------------------------------------------------

/// Periodic progress report published on the watch channel during Recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExportProgress {
    /// Percentage in [0, 100].
    pub percent: f64,
    pub frame: u64,
    pub total_frames: u64,
}

// ---------------------------------------------------------------------------
// EncodedBlob
// ---------------------------------------------------------------------------

/// The finalized container produced by an export run.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBlob {
    pub bytes: Vec<u8>,
    /// Container MIME type, e.g. `video/webm`.
    pub mime: String,
    /// Container duration metadata; `None` until duration repair has run
    /// (streamed containers omit it).
    pub duration_us: Option<TimeUs>,
}

/// Exact number of frames the recording loop produces: `ceil(duration * fps)`.
pub fn total_frames(duration_us: TimeUs, fps: u32) -> u64 {
    if duration_us <= TimeUs::ZERO {
        return 0;
    }
    let ticks = duration_us.0 as u128 * fps as u128;
    ticks.div_ceil(1_000_000) as u64
}

/// Authoritative simulated time of frame `i`: exactly `i / fps` seconds.
pub fn frame_time(frame: u64, fps: u32) -> TimeUs {
    TimeUs((frame as i64 * 1_000_000) / fps as i64)
}
