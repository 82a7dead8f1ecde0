use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TimeUs
// ---------------------------------------------------------------------------

/// Timeline time in microseconds. All model and export arithmetic uses this
/// integer time base; floating seconds only appear at the API edges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeUs(pub i64);

impl TimeUs {
    pub const ZERO: Self = Self(0);

    pub fn from_seconds(s: f64) -> Self {
        Self((s * 1_000_000.0) as i64)
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        Self(self.0.clamp(lo.0, hi.0))
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }
}

impl Default for TimeUs {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for TimeUs {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TimeUs {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i64> for TimeUs {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<i64> for TimeUs {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        Self(self.0 / rhs)
    }
}

impl fmt::Display for TimeUs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_us = self.0.unsigned_abs();
        let total_ms = total_us / 1_000;
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        if self.0 < 0 {
            write!(f, "-{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum clip/overlay length after any resize or trim.
pub const MIN_ELEMENT_DURATION: TimeUs = TimeUs(500_000);

/// Library duration assigned to still images that carry no probed duration.
pub const DEFAULT_IMAGE_DURATION: TimeUs = TimeUs(5_000_000);

/// Placeholder duration for audio assets that have not been probed yet.
pub const DEFAULT_AUDIO_DURATION: TimeUs = TimeUs(30_000_000);

/// Visual nudge applied to duplicated overlays so the copy is visible.
pub const DUPLICATE_NUDGE_PX: f64 = 20.0;

// ---------------------------------------------------------------------------
// MediaKind / MediaItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
    Audio,
}

/// Metadata obtained by probing a source asset (duration, pixel dimensions).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaProbe {
    pub duration_us: TimeUs,
    pub width: u32,
    pub height: u32,
}

/// A source asset in the media library. Immutable once created; clips
/// reference it by id and never own it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: Uuid,
    pub name: String,
    pub kind: MediaKind,
    /// Source locator (URL or path) understood by the export backend.
    pub source: String,
    pub duration_us: TimeUs,
    pub thumbnail: Option<String>,
    pub width: u32,
    pub height: u32,
}

// ---------------------------------------------------------------------------
// TimelineClip
// ---------------------------------------------------------------------------

/// A placed instance of a media item on a track.
///
/// Invariants, maintained by the `Project` mutation operations:
/// `0 <= trim_in < trim_out <= media.duration`, `start >= 0`, and the trim
/// window width always equals `end - start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineClip {
    pub id: Uuid,
    pub media_id: Uuid,
    pub track: u32,
    pub start_us: TimeUs,
    pub end_us: TimeUs,
    pub trim_in_us: TimeUs,
    pub trim_out_us: TimeUs,
}

impl TimelineClip {
    pub fn duration_us(&self) -> TimeUs {
        self.end_us - self.start_us
    }

    /// Right-open active-interval membership: `start <= t < end`.
    pub fn is_active_at(&self, t: TimeUs) -> bool {
        self.start_us <= t && t < self.end_us
    }
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

/// A timed text annotation, positioned in export-resolution coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextOverlay {
    pub id: Uuid,
    pub text: String,
    /// Position in export space (e.g. 1920x1080), independent of preview scale.
    pub x: f64,
    pub y: f64,
    pub font_size: u32,
    pub color: String,
    pub opacity: f64,
    pub rotation_deg: f64,
    pub start_us: TimeUs,
    pub end_us: TimeUs,
}

impl TextOverlay {
    pub fn is_active_at(&self, t: TimeUs) -> bool {
        self.start_us <= t && t < self.end_us
    }
}

/// A timed sticker (glyph) annotation, positioned in export space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StickerOverlay {
    pub id: Uuid,
    pub glyph: String,
    pub x: f64,
    pub y: f64,
    pub size: u32,
    pub opacity: f64,
    pub rotation_deg: f64,
    pub start_us: TimeUs,
    pub end_us: TimeUs,
}

impl StickerOverlay {
    pub fn is_active_at(&self, t: TimeUs) -> bool {
        self.start_us <= t && t < self.end_us
    }
}

// ---------------------------------------------------------------------------
// ProjectSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        preset_1080p()
    }
}

/// 1920x1080 30fps preset.
pub fn preset_1080p() -> ProjectSettings {
    ProjectSettings {
        width: 1920,
        height: 1080,
        fps: 30,
    }
}

/// 1280x720 30fps preset.
pub fn preset_720p() -> ProjectSettings {
    ProjectSettings {
        width: 1280,
        height: 720,
        fps: 30,
    }
}

/// 1080x1920 30fps (vertical/shorts) preset.
pub fn preset_vertical() -> ProjectSettings {
    ProjectSettings {
        width: 1080,
        height: 1920,
        fps: 30,
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Which part of an element a move/resize gesture grabs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
    Body,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
