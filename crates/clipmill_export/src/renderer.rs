//! Frame composition.
//!
//! Given a simulated timeline time, draws the active visual clip and the
//! active overlays onto the capture surface. Exactly one visual clip is
//! drawn per frame (first match in track order); overlays go on top, text
//! before stickers, each collection in insertion order.

use crate::backend::{Color, MediaElement, RenderSurface};
use clipmill_core::snapshot::ProjectSnapshot;
use clipmill_core::types::{MediaKind, TimeUs, TimelineClip};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Seeks smaller than this are skipped; the current frame is close enough.
pub const SEEK_EPSILON: TimeUs = TimeUs(50_000);

/// Composes one frame per call.
///
/// Draw failures on individual elements never abort the frame: the failed
/// draw is skipped and counted, and the surface keeps its previously
/// rendered pixels for that slot, so a transient decode stall degrades to a
/// frozen frame rather than a black flash.
pub struct FrameRenderer {
    background: Color,
    skipped_draws: u64,
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self {
            background: Color::BLACK,
            skipped_draws: 0,
        }
    }

    /// Number of element draws skipped due to transient failures, for
    /// diagnostics.
    pub fn skipped_draws(&self) -> u64 {
        self.skipped_draws
    }

    /// Draw the composite frame for simulated time `t`.
    ///
    /// `elements` maps clip ids to their preloaded media elements. The
    /// `pinned` clip, if any, is clocked externally and is drawn at
    /// whatever position it currently holds, never seeked here.
    pub fn render(
        &mut self,
        snapshot: &ProjectSnapshot,
        elements: &mut HashMap<Uuid, Box<dyn MediaElement>>,
        t: TimeUs,
        pinned: Option<Uuid>,
        surface: &mut dyn RenderSurface,
    ) {
        match snapshot.active_visual_clip(t) {
            Some(clip) => match snapshot.clip_kind(clip) {
                Some(MediaKind::Video) => {
                    self.draw_video_clip(snapshot, elements, clip, t, pinned, surface)
                }
                Some(MediaKind::Image) => {
                    if let Err(e) = surface.draw_image(clip.media_id) {
                        self.skip(clip.media_id, "image draw", &e.to_string());
                    }
                }
                _ => {}
            },
            // No visual clip: solid background, never a gap in output.
            None => surface.fill(self.background),
        }

        for overlay in &snapshot.texts {
            if overlay.is_active_at(t) {
                if let Err(e) = surface.draw_text(overlay) {
                    self.skip(overlay.id, "text draw", &e.to_string());
                }
            }
        }
        for overlay in &snapshot.stickers {
            if overlay.is_active_at(t) {
                if let Err(e) = surface.draw_sticker(overlay) {
                    self.skip(overlay.id, "sticker draw", &e.to_string());
                }
            }
        }
    }

    fn draw_video_clip(
        &mut self,
        snapshot: &ProjectSnapshot,
        elements: &mut HashMap<Uuid, Box<dyn MediaElement>>,
        clip: &TimelineClip,
        t: TimeUs,
        pinned: Option<Uuid>,
        surface: &mut dyn RenderSurface,
    ) {
        let Some(element) = elements.get_mut(&clip.id) else {
            self.skip(clip.id, "video draw", "no preloaded element for clip");
            return;
        };

        if pinned != Some(clip.id) {
            let media_duration = snapshot
                .media_item(clip.media_id)
                .map(|m| m.duration_us)
                .unwrap_or(element.duration_us());
            let relative =
                (t - clip.start_us + clip.trim_in_us).clamp(TimeUs::ZERO, media_duration);

            let drift = TimeUs((element.position_us() - relative).0.abs());
            if drift > SEEK_EPSILON {
                if let Err(e) = element.seek(relative) {
                    // Keep compositing with whatever frame the element holds.
                    self.skip(clip.id, "video seek", &e.to_string());
                }
            }
        }

        if let Err(e) = surface.draw_video_frame(element.as_mut()) {
            self.skip(clip.id, "video draw", &e.to_string());
        }
    }

    fn skip(&mut self, id: Uuid, what: &str, reason: &str) {
        self.skipped_draws += 1;
        warn!(%id, what, reason, "skipping element draw, keeping last frame");
    }
}
