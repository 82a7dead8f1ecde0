//! In-crate mock backends for exercising the exporter without a platform.
//!
//! All mocks clone by sharing state, so a test can keep a handle while the
//! exporter owns the boxed trait object, then assert on what happened.

use crate::backend::{
    AudioBackend, Color, ExportBackend, MediaElement, MixOutputHandle, RenderSurface,
    SourceNodeId, StreamingEncoder,
};
use crate::encoder::{EncodedBlob, ExportConfig};
use crate::error::{AudioError, EncodeError, MediaError};
use crate::exporter::CancelHandle;
use clipmill_core::snapshot::ProjectSnapshot;
use clipmill_core::types::{MediaKind, StickerOverlay, TextOverlay, TimeUs};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ElementState {
    media_id: Uuid,
    kind: MediaKind,
    duration_us: TimeUs,
    position_us: TimeUs,
    seeks: Vec<TimeUs>,
    ready: bool,
    paused: bool,
    played: bool,
    muted: bool,
    looping: bool,
}

/// Test-side view of a mock element's state.
#[derive(Clone)]
pub struct MockElementHandle(Arc<Mutex<ElementState>>);

impl MockElementHandle {
    pub fn seeks(&self) -> Vec<TimeUs> {
        self.0.lock().unwrap().seeks.clone()
    }

    pub fn set_position(&self, position: TimeUs) {
        self.0.lock().unwrap().position_us = position;
    }

    pub fn set_ready(&self, ready: bool) {
        self.0.lock().unwrap().ready = ready;
    }

    pub fn paused(&self) -> bool {
        self.0.lock().unwrap().paused
    }

    /// Whether playback was ever started on this element.
    pub fn played(&self) -> bool {
        self.0.lock().unwrap().played
    }

    pub fn muted(&self) -> bool {
        self.0.lock().unwrap().muted
    }

    pub fn looping(&self) -> bool {
        self.0.lock().unwrap().looping
    }
}

struct MockElement(Arc<Mutex<ElementState>>);

impl MediaElement for MockElement {
    fn media_id(&self) -> Uuid {
        self.0.lock().unwrap().media_id
    }

    fn kind(&self) -> MediaKind {
        self.0.lock().unwrap().kind
    }

    fn duration_us(&self) -> TimeUs {
        self.0.lock().unwrap().duration_us
    }

    fn is_ready(&self) -> bool {
        self.0.lock().unwrap().ready
    }

    fn position_us(&self) -> TimeUs {
        self.0.lock().unwrap().position_us
    }

    fn seek(&mut self, target_us: TimeUs) -> Result<(), MediaError> {
        let mut s = self.0.lock().unwrap();
        s.seeks.push(target_us);
        s.position_us = target_us;
        Ok(())
    }

    fn play(&mut self) {
        let mut s = self.0.lock().unwrap();
        s.paused = false;
        s.played = true;
    }

    fn pause(&mut self) {
        self.0.lock().unwrap().paused = true;
    }

    fn set_muted(&mut self, muted: bool) {
        self.0.lock().unwrap().muted = muted;
    }

    fn set_looping(&mut self, looping: bool) {
        self.0.lock().unwrap().looping = looping;
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Everything a mock surface was asked to draw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    Fill,
    Video { media_id: Uuid, position_us: TimeUs },
    Image { media_id: Uuid },
    Text { id: Uuid },
    Sticker { id: Uuid },
}

struct MockSurface {
    width: u32,
    height: u32,
    ops: Arc<Mutex<Vec<SurfaceOp>>>,
    fail_video: Arc<AtomicBool>,
}

impl RenderSurface for MockSurface {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill(&mut self, _color: Color) {
        self.ops.lock().unwrap().push(SurfaceOp::Fill);
    }

    fn draw_video_frame(&mut self, element: &mut dyn MediaElement) -> Result<(), MediaError> {
        if self.fail_video.load(Ordering::SeqCst) {
            return Err(MediaError::Decode("mock video draw failure".into()));
        }
        self.ops.lock().unwrap().push(SurfaceOp::Video {
            media_id: element.media_id(),
            position_us: element.position_us(),
        });
        Ok(())
    }

    fn draw_image(&mut self, media_id: Uuid) -> Result<(), MediaError> {
        self.ops.lock().unwrap().push(SurfaceOp::Image { media_id });
        Ok(())
    }

    fn draw_text(&mut self, overlay: &TextOverlay) -> Result<(), MediaError> {
        self.ops.lock().unwrap().push(SurfaceOp::Text { id: overlay.id });
        Ok(())
    }

    fn draw_sticker(&mut self, overlay: &StickerOverlay) -> Result<(), MediaError> {
        self.ops
            .lock()
            .unwrap()
            .push(SurfaceOp::Sticker { id: overlay.id });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

#[derive(Default)]
struct EncoderState {
    started: bool,
    frames: u64,
    stopped: bool,
    aborted: bool,
    fail_repair: bool,
    cancel_after: Option<(u64, CancelHandle)>,
}

struct MockEncoder(Arc<Mutex<EncoderState>>);

impl StreamingEncoder for MockEncoder {
    fn start(&mut self, _fps: u32) -> Result<(), EncodeError> {
        self.0.lock().unwrap().started = true;
        Ok(())
    }

    fn capture_frame(&mut self, _surface: &dyn RenderSurface) -> Result<(), EncodeError> {
        let mut s = self.0.lock().unwrap();
        s.frames += 1;
        if let Some((after, cancel)) = &s.cancel_after {
            if s.frames >= *after {
                cancel.cancel();
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<EncodedBlob, EncodeError> {
        let mut s = self.0.lock().unwrap();
        s.stopped = true;
        Ok(EncodedBlob {
            bytes: vec![0u8; s.frames as usize * 64],
            mime: "video/webm".into(),
            duration_us: None,
        })
    }

    fn abort(&mut self) {
        self.0.lock().unwrap().aborted = true;
    }

    fn repair_duration(
        &mut self,
        blob: &mut EncodedBlob,
        duration_us: TimeUs,
    ) -> Result<(), EncodeError> {
        if self.0.lock().unwrap().fail_repair {
            return Err(EncodeError::DurationRepair("mock repair failure".into()));
        }
        blob.duration_us = Some(duration_us);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

#[derive(Default)]
struct AudioState {
    next_node: u64,
    active: HashMap<SourceNodeId, Uuid>,
    created: usize,
    disconnected: usize,
    destroyed: usize,
    master_gain: f64,
}

/// Shared-state mock of the audio graph. Enforces the one-wrap-per-element
/// rule so mixer bookkeeping bugs surface as test failures.
#[derive(Clone, Default)]
pub struct MockAudioBackend(Arc<Mutex<AudioState>>);

impl MockAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_sources(&self) -> usize {
        self.0.lock().unwrap().created
    }

    pub fn disconnected_sources(&self) -> usize {
        self.0.lock().unwrap().disconnected
    }

    pub fn destroyed_graphs(&self) -> usize {
        self.0.lock().unwrap().destroyed
    }

    pub fn master_gain(&self) -> f64 {
        self.0.lock().unwrap().master_gain
    }
}

impl AudioBackend for MockAudioBackend {
    fn create_graph(&mut self) -> Result<MixOutputHandle, AudioError> {
        Ok(MixOutputHandle(1))
    }

    fn create_source(&mut self, element_id: Uuid) -> Result<SourceNodeId, AudioError> {
        let mut s = self.0.lock().unwrap();
        if s.active.values().any(|id| *id == element_id) {
            return Err(AudioError::SourceAlreadyWrapped(element_id));
        }
        s.next_node += 1;
        let node = SourceNodeId(s.next_node);
        s.active.insert(node, element_id);
        s.created += 1;
        Ok(node)
    }

    fn set_source_gain(&mut self, _node: SourceNodeId, _gain: f64) {}

    fn set_master_gain(&mut self, gain: f64) {
        self.0.lock().unwrap().master_gain = gain;
    }

    fn disconnect_source(&mut self, node: SourceNodeId) {
        let mut s = self.0.lock().unwrap();
        if s.active.remove(&node).is_some() {
            s.disconnected += 1;
        }
    }

    fn destroy_graph(&mut self) {
        self.0.lock().unwrap().destroyed += 1;
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Full mock [`ExportBackend`]. Clones share all state.
#[derive(Clone)]
pub struct MockBackend {
    elements: Arc<Mutex<HashMap<Uuid, Arc<Mutex<ElementState>>>>>,
    ops: Arc<Mutex<Vec<SurfaceOp>>>,
    fail_video: Arc<AtomicBool>,
    encoder: Arc<Mutex<EncoderState>>,
    encoders_created: Arc<AtomicUsize>,
    audio: MockAudioBackend,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            elements: Arc::new(Mutex::new(HashMap::new())),
            ops: Arc::new(Mutex::new(Vec::new())),
            fail_video: Arc::new(AtomicBool::new(false)),
            encoder: Arc::new(Mutex::new(EncoderState::default())),
            encoders_created: Arc::new(AtomicUsize::new(0)),
            audio: MockAudioBackend::new(),
        }
    }

    /// Register an element state for every media item in the snapshot.
    pub fn register_media(&mut self, snapshot: &ProjectSnapshot) {
        let mut elements = self.elements.lock().unwrap();
        for media in &snapshot.media {
            elements.insert(
                media.id,
                Arc::new(Mutex::new(ElementState {
                    media_id: media.id,
                    kind: media.kind,
                    duration_us: media.duration_us,
                    position_us: TimeUs::ZERO,
                    seeks: Vec::new(),
                    ready: true,
                    paused: true,
                    played: false,
                    muted: false,
                    looping: false,
                })),
            );
        }
    }

    pub fn element(&self, media_id: Uuid) -> MockElementHandle {
        MockElementHandle(
            self.elements
                .lock()
                .unwrap()
                .get(&media_id)
                .expect("media not registered")
                .clone(),
        )
    }

    pub fn surface_ops(&self) -> Vec<SurfaceOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear_surface_ops(&self) {
        self.ops.lock().unwrap().clear();
    }

    pub fn fail_video_draws(&self, fail: bool) {
        self.fail_video.store(fail, Ordering::SeqCst);
    }

    pub fn frames_captured(&self) -> u64 {
        self.encoder.lock().unwrap().frames
    }

    pub fn encoders_created(&self) -> usize {
        self.encoders_created.load(Ordering::SeqCst)
    }

    pub fn encoder_stopped(&self) -> bool {
        self.encoder.lock().unwrap().stopped
    }

    pub fn encoder_aborted(&self) -> bool {
        self.encoder.lock().unwrap().aborted
    }

    pub fn fail_duration_repair(&self, fail: bool) {
        self.encoder.lock().unwrap().fail_repair = fail;
    }

    /// Trip the cancel handle once this many frames have been captured.
    pub fn cancel_after_frames(&self, frames: u64, cancel: CancelHandle) {
        self.encoder.lock().unwrap().cancel_after = Some((frames, cancel));
    }

    pub fn audio(&self) -> MockAudioBackend {
        self.audio.clone()
    }
}

impl ExportBackend for MockBackend {
    fn open_media(
        &mut self,
        media: &clipmill_core::types::MediaItem,
    ) -> Result<Box<dyn MediaElement>, MediaError> {
        let state = self
            .elements
            .lock()
            .unwrap()
            .get(&media.id)
            .cloned()
            .ok_or_else(|| MediaError::Unavailable(format!("unregistered media {}", media.id)))?;
        Ok(Box::new(MockElement(state)))
    }

    fn create_surface(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn RenderSurface>, EncodeError> {
        Ok(Box::new(MockSurface {
            width,
            height,
            ops: self.ops.clone(),
            fail_video: self.fail_video.clone(),
        }))
    }

    fn create_encoder(
        &mut self,
        _config: &ExportConfig,
    ) -> Result<Box<dyn StreamingEncoder>, EncodeError> {
        self.encoders_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockEncoder(self.encoder.clone())))
    }

    fn create_audio_backend(&mut self) -> Box<dyn AudioBackend> {
        Box::new(self.audio.clone())
    }
}
