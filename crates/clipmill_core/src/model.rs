use crate::types::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The editing session aggregate: media library, placed clips, overlays, and
/// the derived playback state.
///
/// All mutation goes through the named operations below so the derived
/// duration and the clip/trim invariants stay enforced in one place.
/// Operations are defensive: a stale or unknown id is a no-op, never a panic
/// or an error, because UI events can race ahead of the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub settings: ProjectSettings,
    media: Vec<MediaItem>,
    clips: Vec<TimelineClip>,
    texts: Vec<TextOverlay>,
    stickers: Vec<StickerOverlay>,
    duration_us: TimeUs,
    playhead_us: TimeUs,
    selected: Option<Uuid>,
    playing: bool,
}

impl Project {
    pub fn new(name: impl Into<String>, settings: ProjectSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            settings,
            media: vec![],
            clips: vec![],
            texts: vec![],
            stickers: vec![],
            duration_us: TimeUs::ZERO,
            playhead_us: TimeUs::ZERO,
            selected: None,
            playing: false,
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn media(&self) -> &[MediaItem] {
        &self.media
    }

    pub fn clips(&self) -> &[TimelineClip] {
        &self.clips
    }

    pub fn texts(&self) -> &[TextOverlay] {
        &self.texts
    }

    pub fn stickers(&self) -> &[StickerOverlay] {
        &self.stickers
    }

    pub fn duration_us(&self) -> TimeUs {
        self.duration_us
    }

    pub fn playhead_us(&self) -> TimeUs {
        self.playhead_us
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn media_item(&self, id: Uuid) -> Option<&MediaItem> {
        self.media.iter().find(|m| m.id == id)
    }

    pub fn clip(&self, id: Uuid) -> Option<&TimelineClip> {
        self.clips.iter().find(|c| c.id == id)
    }

    // -----------------------------------------------------------------------
    // Media library
    // -----------------------------------------------------------------------

    /// Add a source asset to the library. Duration falls back to the
    /// per-kind default when the asset has not been probed (images 5s,
    /// audio a 30s placeholder); video keeps whatever the probe reported.
    pub fn add_media(
        &mut self,
        name: impl Into<String>,
        kind: MediaKind,
        source: impl Into<String>,
        probe: Option<MediaProbe>,
    ) -> Uuid {
        let probe = probe.unwrap_or_default();
        let duration_us = if probe.duration_us > TimeUs::ZERO {
            probe.duration_us
        } else {
            match kind {
                MediaKind::Image => DEFAULT_IMAGE_DURATION,
                MediaKind::Audio => DEFAULT_AUDIO_DURATION,
                MediaKind::Video => TimeUs::ZERO,
            }
        };
        let item = MediaItem {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            source: source.into(),
            duration_us,
            thumbnail: None,
            width: probe.width,
            height: probe.height,
        };
        let id = item.id;
        self.media.push(item);
        id
    }

    // -----------------------------------------------------------------------
    // Overlays
    // -----------------------------------------------------------------------

    /// Add a text overlay to the timeline. Returns its id.
    pub fn add_text_overlay(&mut self, overlay: TextOverlay) -> Uuid {
        let id = overlay.id;
        self.texts.push(overlay);
        self.recompute_duration();
        id
    }

    /// Add a sticker overlay to the timeline. Returns its id.
    pub fn add_sticker_overlay(&mut self, overlay: StickerOverlay) -> Uuid {
        let id = overlay.id;
        self.stickers.push(overlay);
        self.recompute_duration();
        id
    }

    // -----------------------------------------------------------------------
    // Clip placement
    // -----------------------------------------------------------------------

    /// Place a media item on a track as a new clip spanning its full
    /// (untrimmed) duration.
    ///
    /// When no start time is given the clip is appended after the last clip
    /// on that track. When the requested interval collides with an existing
    /// clip, the start is shifted to the end of the colliding clip until the
    /// interval is free; clips on one track never overlap.
    pub fn place_on_track(
        &mut self,
        media_id: Uuid,
        track: u32,
        start_us: Option<TimeUs>,
    ) -> Option<Uuid> {
        let media = self.media_item(media_id)?;
        let len = media.duration_us;
        if len < MIN_ELEMENT_DURATION {
            return None;
        }

        let mut start = match start_us {
            Some(s) => s.max(TimeUs::ZERO),
            None => self.track_end(track),
        };
        loop {
            let collision = self
                .clips
                .iter()
                .filter(|c| c.track == track)
                .find(|c| c.start_us < start + len && start < c.end_us)
                .map(|c| c.end_us);
            match collision {
                Some(end) => start = end,
                None => break,
            }
        }

        let clip = TimelineClip {
            id: Uuid::new_v4(),
            media_id,
            track,
            start_us: start,
            end_us: start + len,
            trim_in_us: TimeUs::ZERO,
            trim_out_us: len,
        };
        let id = clip.id;
        self.clips.push(clip);
        self.recompute_duration();
        Some(id)
    }

    /// Latest end time among clips on the given track.
    fn track_end(&self, track: u32) -> TimeUs {
        self.clips
            .iter()
            .filter(|c| c.track == track)
            .map(|c| c.end_us)
            .fold(TimeUs::ZERO, TimeUs::max)
    }

    // -----------------------------------------------------------------------
    // Move / resize
    // -----------------------------------------------------------------------

    /// Apply a drag delta to an element edge.
    ///
    /// `Start`/`End` resize the element, keeping at least the minimum
    /// element duration; for media clips the trim window follows the edge
    /// so the visible source material stays anchored. `Body` shifts the
    /// whole element, clamped to a non-negative start. Unknown ids are a
    /// no-op.
    pub fn move_or_resize(&mut self, id: Uuid, edge: Edge, delta_us: TimeUs) {
        if let Some(idx) = self.clips.iter().position(|c| c.id == id) {
            let media_duration = self
                .media_item(self.clips[idx].media_id)
                .map(|m| m.duration_us)
                .unwrap_or(self.clips[idx].trim_out_us);
            let clip = &mut self.clips[idx];
            match edge {
                Edge::Start => {
                    // The start edge cannot move earlier than trim-in allows
                    // nor later than min-duration allows.
                    let lo = (clip.start_us - clip.trim_in_us).max(TimeUs::ZERO);
                    let hi = clip.end_us - MIN_ELEMENT_DURATION;
                    let new_start = (clip.start_us + delta_us).clamp(lo, hi);
                    clip.trim_in_us = clip.trim_in_us + (new_start - clip.start_us);
                    clip.start_us = new_start;
                }
                Edge::End => {
                    let lo = clip.start_us + MIN_ELEMENT_DURATION;
                    let hi = clip.start_us + (media_duration - clip.trim_in_us);
                    let new_end = (clip.end_us + delta_us).clamp(lo, hi);
                    clip.trim_out_us = clip.trim_out_us + (new_end - clip.end_us);
                    clip.end_us = new_end;
                }
                Edge::Body => {
                    let new_start = (clip.start_us + delta_us).max(TimeUs::ZERO);
                    let shift = new_start - clip.start_us;
                    clip.start_us = clip.start_us + shift;
                    clip.end_us = clip.end_us + shift;
                }
            }
            self.recompute_duration();
            return;
        }

        if let Some(text) = self.texts.iter_mut().find(|t| t.id == id) {
            let (start, end) =
                resize_interval(text.start_us, text.end_us, edge, delta_us);
            text.start_us = start;
            text.end_us = end;
            self.recompute_duration();
            return;
        }

        if let Some(sticker) = self.stickers.iter_mut().find(|s| s.id == id) {
            let (start, end) =
                resize_interval(sticker.start_us, sticker.end_us, edge, delta_us);
            sticker.start_us = start;
            sticker.end_us = end;
            self.recompute_duration();
        }
    }

    // -----------------------------------------------------------------------
    // Split
    // -----------------------------------------------------------------------

    /// Split an element at a timeline position strictly inside its interval.
    ///
    /// The original keeps its id and becomes the left half; the right half
    /// gets a fresh id. For media clips the trim window is partitioned at
    /// the corresponding source offset. Splitting at or outside the element
    /// bounds leaves the model unchanged and returns `None`.
    pub fn split_at(&mut self, id: Uuid, at_us: TimeUs) -> Option<(Uuid, Uuid)> {
        if let Some(idx) = self.clips.iter().position(|c| c.id == id) {
            let clip = self.clips[idx].clone();
            if at_us <= clip.start_us || at_us >= clip.end_us {
                return None;
            }
            let split_source = clip.trim_in_us + (at_us - clip.start_us);
            let right = TimelineClip {
                id: Uuid::new_v4(),
                media_id: clip.media_id,
                track: clip.track,
                start_us: at_us,
                end_us: clip.end_us,
                trim_in_us: split_source,
                trim_out_us: clip.trim_out_us,
            };
            let right_id = right.id;
            {
                let left = &mut self.clips[idx];
                left.end_us = at_us;
                left.trim_out_us = split_source;
            }
            self.clips.insert(idx + 1, right);
            return Some((id, right_id));
        }

        if let Some(idx) = self.texts.iter().position(|t| t.id == id) {
            let text = self.texts[idx].clone();
            if at_us <= text.start_us || at_us >= text.end_us {
                return None;
            }
            let mut right = text.clone();
            right.id = Uuid::new_v4();
            right.start_us = at_us;
            let right_id = right.id;
            self.texts[idx].end_us = at_us;
            self.texts.insert(idx + 1, right);
            return Some((id, right_id));
        }

        if let Some(idx) = self.stickers.iter().position(|s| s.id == id) {
            let sticker = self.stickers[idx].clone();
            if at_us <= sticker.start_us || at_us >= sticker.end_us {
                return None;
            }
            let mut right = sticker.clone();
            right.id = Uuid::new_v4();
            right.start_us = at_us;
            let right_id = right.id;
            self.stickers[idx].end_us = at_us;
            self.stickers.insert(idx + 1, right);
            return Some((id, right_id));
        }

        None
    }

    // -----------------------------------------------------------------------
    // Duplicate
    // -----------------------------------------------------------------------

    /// Clone an element, appending the copy right after the original's end
    /// time. Overlay copies are nudged +20/+20 px so they are visibly
    /// distinct.
    pub fn duplicate(&mut self, id: Uuid) -> Option<Uuid> {
        if let Some(clip) = self.clips.iter().find(|c| c.id == id).cloned() {
            let len = clip.duration_us();
            let copy = TimelineClip {
                id: Uuid::new_v4(),
                start_us: clip.end_us,
                end_us: clip.end_us + len,
                ..clip
            };
            let copy_id = copy.id;
            self.clips.push(copy);
            self.recompute_duration();
            return Some(copy_id);
        }

        if let Some(text) = self.texts.iter().find(|t| t.id == id).cloned() {
            let len = text.end_us - text.start_us;
            let mut copy = text;
            copy.id = Uuid::new_v4();
            copy.start_us = copy.end_us;
            copy.end_us = copy.start_us + len;
            copy.x += DUPLICATE_NUDGE_PX;
            copy.y += DUPLICATE_NUDGE_PX;
            let copy_id = copy.id;
            self.texts.push(copy);
            self.recompute_duration();
            return Some(copy_id);
        }

        if let Some(sticker) = self.stickers.iter().find(|s| s.id == id).cloned() {
            let len = sticker.end_us - sticker.start_us;
            let mut copy = sticker;
            copy.id = Uuid::new_v4();
            copy.start_us = copy.end_us;
            copy.end_us = copy.start_us + len;
            copy.x += DUPLICATE_NUDGE_PX;
            copy.y += DUPLICATE_NUDGE_PX;
            let copy_id = copy.id;
            self.stickers.push(copy);
            self.recompute_duration();
            return Some(copy_id);
        }

        None
    }

    // -----------------------------------------------------------------------
    // Delete / selection / transport
    // -----------------------------------------------------------------------

    /// Remove the currently selected element from whichever collection holds
    /// it. Clears the selection. No-op when nothing is selected.
    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected.take() else {
            return;
        };
        if let Some(idx) = self.clips.iter().position(|c| c.id == id) {
            self.clips.remove(idx);
        } else if let Some(idx) = self.texts.iter().position(|t| t.id == id) {
            self.texts.remove(idx);
        } else if let Some(idx) = self.stickers.iter().position(|s| s.id == id) {
            self.stickers.remove(idx);
        }
        self.recompute_duration();
    }

    /// Select an element by id, or clear the selection with `None`.
    /// Selecting an unknown id is a no-op.
    pub fn select(&mut self, id: Option<Uuid>) {
        match id {
            None => self.selected = None,
            Some(id) => {
                if self.element_exists(id) {
                    self.selected = Some(id);
                }
            }
        }
    }

    pub fn set_playhead(&mut self, t: TimeUs) {
        self.playhead_us = t.clamp(TimeUs::ZERO, self.duration_us);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    fn element_exists(&self, id: Uuid) -> bool {
        self.clips.iter().any(|c| c.id == id)
            || self.texts.iter().any(|t| t.id == id)
            || self.stickers.iter().any(|s| s.id == id)
    }

    // -----------------------------------------------------------------------
    // Derived duration
    // -----------------------------------------------------------------------

    /// Recompute the project duration as the max end time over all placed
    /// elements, and keep the playhead within the new bounds. Called after
    /// every structural mutation.
    fn recompute_duration(&mut self) {
        let clips = self.clips.iter().map(|c| c.end_us);
        let texts = self.texts.iter().map(|t| t.end_us);
        let stickers = self.stickers.iter().map(|s| s.end_us);
        self.duration_us = clips
            .chain(texts)
            .chain(stickers)
            .fold(TimeUs::ZERO, TimeUs::max);
        self.playhead_us = self.playhead_us.clamp(TimeUs::ZERO, self.duration_us);
    }
}

/// Shared resize arithmetic for overlay intervals.
///
/// Overlays are created with arbitrary intervals, so one may already be
/// shorter than the minimum; resizing such an interval can grow it but
/// never shrink it further.
fn resize_interval(start: TimeUs, end: TimeUs, edge: Edge, delta: TimeUs) -> (TimeUs, TimeUs) {
    match edge {
        Edge::Start => {
            let hi = (end - MIN_ELEMENT_DURATION).max(start).max(TimeUs::ZERO);
            let new_start = (start + delta).clamp(TimeUs::ZERO, hi);
            (new_start, end)
        }
        Edge::End => {
            let new_end = (end + delta).max(start + MIN_ELEMENT_DURATION);
            (start, new_end)
        }
        Edge::Body => {
            let new_start = (start + delta).max(TimeUs::ZERO);
            let shift = new_start - start;
            (start + shift, end + shift)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
