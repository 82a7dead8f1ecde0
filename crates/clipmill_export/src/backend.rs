//! Platform seam for the exporter.
//!
//! The export engine itself is pure orchestration; everything that touches a
//! real decoder, raster surface, audio graph, or container encoder sits
//! behind these object-safe traits. A browser/WASM backend, an ffmpeg
//! backend, and the in-crate test mocks all implement the same contract.

use crate::encoder::{EncodedBlob, ExportConfig};
use crate::error::{AudioError, EncodeError, MediaError};
use clipmill_core::types::{MediaItem, MediaKind, StickerOverlay, TextOverlay, TimeUs};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// MediaElement
// ---------------------------------------------------------------------------

/// An offscreen playback handle for one source asset, exclusively owned by
/// an export run. Elements are created paused, muted, and with looping
/// disabled; the exporter resumes the audible ones for the recording phase,
/// and only the audio mixer's graph ever produces audible output.
pub trait MediaElement: Send {
    fn media_id(&self) -> Uuid;

    fn kind(&self) -> MediaKind;

    /// Native duration of the underlying source.
    fn duration_us(&self) -> TimeUs;

    /// Whether the element is decodably ready (metadata + first frame).
    fn is_ready(&self) -> bool;

    /// Current playback position.
    fn position_us(&self) -> TimeUs;

    /// Seek to a position within the source.
    fn seek(&mut self, target_us: TimeUs) -> Result<(), MediaError>;

    /// Resume playback. The audio graph mixes from playing elements, so the
    /// exporter starts the audible ones when recording begins.
    fn play(&mut self);

    fn pause(&mut self);

    fn set_muted(&mut self, muted: bool);

    fn set_looping(&mut self, looping: bool);
}

// ---------------------------------------------------------------------------
// RenderSurface
// ---------------------------------------------------------------------------

/// Solid fill color in 8-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
}

/// The offscreen raster target the renderer composes frames onto.
///
/// Draw calls that fail leave the previously rendered pixels in place; the
/// renderer relies on that to degrade transient decode stalls into a frozen
/// frame instead of a black flash.
pub trait RenderSurface: Send {
    fn dimensions(&self) -> (u32, u32);

    /// Fill the whole surface with a solid color.
    fn fill(&mut self, color: Color);

    /// Draw the element's current video frame, scaled to fill the surface
    /// (aspect fill, not letterbox).
    fn draw_video_frame(&mut self, element: &mut dyn MediaElement) -> Result<(), MediaError>;

    /// Draw a still image asset scaled to fill the surface.
    fn draw_image(&mut self, media_id: Uuid) -> Result<(), MediaError>;

    /// Draw a text overlay with a contrasting outline stroke.
    fn draw_text(&mut self, overlay: &TextOverlay) -> Result<(), MediaError>;

    /// Draw a sticker glyph at its stored position/size/opacity.
    fn draw_sticker(&mut self, overlay: &StickerOverlay) -> Result<(), MediaError>;
}

// ---------------------------------------------------------------------------
// StreamingEncoder
// ---------------------------------------------------------------------------

/// A streaming video+audio encoder fed one frame at a time.
///
/// Chunks are buffered internally and assembled into the final blob at
/// `stop`. Streamed containers commonly omit a usable duration header, so
/// `repair_duration` rewrites it after the fact.
pub trait StreamingEncoder: Send {
    fn start(&mut self, fps: u32) -> Result<(), EncodeError>;

    /// Capture the surface's current pixels as the next frame.
    fn capture_frame(&mut self, surface: &dyn RenderSurface) -> Result<(), EncodeError>;

    /// Stop and assemble the buffered chunks into the container blob.
    fn stop(&mut self) -> Result<EncodedBlob, EncodeError>;

    /// Stop without finalizing; buffered chunks are discarded.
    fn abort(&mut self);

    /// Rewrite the container's duration metadata in place.
    fn repair_duration(
        &mut self,
        blob: &mut EncodedBlob,
        duration_us: TimeUs,
    ) -> Result<(), EncodeError>;
}

// ---------------------------------------------------------------------------
// AudioBackend
// ---------------------------------------------------------------------------

/// Handle to the audio graph's mixed output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixOutputHandle(pub u64);

/// Handle to one source node inside the audio graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceNodeId(pub u64);

/// The real-time audio graph underneath the [`crate::mixer::AudioMixer`].
///
/// `create_source` must reject wrapping the same media element twice; the
/// mixer's per-id bookkeeping guarantees it disconnects a prior node before
/// re-registering an id.
pub trait AudioBackend: Send {
    fn create_graph(&mut self) -> Result<MixOutputHandle, AudioError>;

    fn create_source(&mut self, element_id: Uuid) -> Result<SourceNodeId, AudioError>;

    fn set_source_gain(&mut self, node: SourceNodeId, gain: f64);

    fn set_master_gain(&mut self, gain: f64);

    fn disconnect_source(&mut self, node: SourceNodeId);

    fn destroy_graph(&mut self);
}

// ---------------------------------------------------------------------------
// ExportBackend
// ---------------------------------------------------------------------------

/// Factory for all platform resources one export run needs.
pub trait ExportBackend: Send {
    fn open_media(&mut self, media: &MediaItem) -> Result<Box<dyn MediaElement>, MediaError>;

    fn create_surface(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn RenderSurface>, EncodeError>;

    fn create_encoder(
        &mut self,
        config: &ExportConfig,
    ) -> Result<Box<dyn StreamingEncoder>, EncodeError>;

    fn create_audio_backend(&mut self) -> Box<dyn AudioBackend>;
}
