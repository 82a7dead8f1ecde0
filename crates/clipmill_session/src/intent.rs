use clipmill_core::types::{Edge, MediaKind, MediaProbe, StickerOverlay, TextOverlay, TimeUs};
use uuid::Uuid;

/// One user-driven edit, expressed as data so the session can gate, log,
/// and replay edits uniformly.
#[derive(Debug, Clone)]
pub enum EditIntent {
    AddMedia {
        name: String,
        kind: MediaKind,
        source: String,
        probe: Option<MediaProbe>,
    },
    AddTextOverlay(TextOverlay),
    AddStickerOverlay(StickerOverlay),
    PlaceOnTrack {
        media_id: Uuid,
        track: u32,
        start_us: Option<TimeUs>,
    },
    MoveOrResize {
        id: Uuid,
        edge: Edge,
        delta_us: TimeUs,
    },
    SplitAt {
        id: Uuid,
        at_us: TimeUs,
    },
    Duplicate {
        id: Uuid,
    },
    Select {
        id: Option<Uuid>,
    },
    DeleteSelected,
    SetPlayhead {
        at_us: TimeUs,
    },
    SetPlaying {
        playing: bool,
    },
}
