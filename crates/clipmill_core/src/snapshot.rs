use crate::model::Project;
use crate::types::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable copy of the project taken at export start.
///
/// The exporter reads only this snapshot for the whole run, so UI-driven
/// model mutations between export runs can never race the frame loop. Clips
/// are ordered by track (insertion order within a track preserved), which is
/// also the tie-break order when more than one visual clip is active at a
/// given time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSnapshot {
    pub settings: ProjectSettings,
    pub media: Vec<MediaItem>,
    pub clips: Vec<TimelineClip>,
    pub texts: Vec<TextOverlay>,
    pub stickers: Vec<StickerOverlay>,
    pub duration_us: TimeUs,
}

impl Project {
    /// Take the export snapshot of the current timeline state.
    pub fn snapshot(&self) -> ProjectSnapshot {
        let mut clips = self.clips().to_vec();
        clips.sort_by_key(|c| c.track);
        ProjectSnapshot {
            settings: self.settings.clone(),
            media: self.media().to_vec(),
            clips,
            texts: self.texts().to_vec(),
            stickers: self.stickers().to_vec(),
            duration_us: self.duration_us(),
        }
    }
}

impl ProjectSnapshot {
    pub fn media_item(&self, id: Uuid) -> Option<&MediaItem> {
        self.media.iter().find(|m| m.id == id)
    }

    /// The media kind backing a clip, if the reference resolves.
    pub fn clip_kind(&self, clip: &TimelineClip) -> Option<MediaKind> {
        self.media_item(clip.media_id).map(|m| m.kind)
    }

    /// First visual (video or image) clip active at `t`, in track order.
    /// Simultaneously active visual clips are not layered; the first match
    /// wins.
    pub fn active_visual_clip(&self, t: TimeUs) -> Option<&TimelineClip> {
        self.clips.iter().find(|c| {
            c.is_active_at(t)
                && matches!(
                    self.clip_kind(c),
                    Some(MediaKind::Video) | Some(MediaKind::Image)
                )
        })
    }

    /// First video-backed clip in track order; its media element becomes the
    /// export's audio reference clock.
    pub fn first_video_clip(&self) -> Option<&TimelineClip> {
        self.clips
            .iter()
            .find(|c| self.clip_kind(c) == Some(MediaKind::Video))
    }
}
