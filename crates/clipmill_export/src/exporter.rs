//! The export engine.
//!
//! Drives one export run through its phases: preload every clip's media
//! element, route audio through the mixer graph, then record frames against
//! a simulated clock. Frame `i` is always composed for time `i / fps`; the
//! wall clock is used only to pace the loop so real-time capture backends
//! (and the audio graph) stay in step. Slow frames therefore never drop
//! content, they only stretch the run.

use crate::backend::{ExportBackend, MediaElement, RenderSurface, StreamingEncoder};
use crate::encoder::{frame_time, total_frames, EncodedBlob, ExportConfig, ExportProgress};
use crate::error::{ExportError, Result};
use crate::mixer::AudioMixer;
use crate::renderer::FrameRenderer;
use clipmill_core::snapshot::ProjectSnapshot;
use clipmill_core::types::{MediaKind, TimeUs, TimelineClip};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How long preload may take before the run fails.
pub const PRELOAD_TIMEOUT: Duration = Duration::from_secs(8);
/// Poll interval while waiting for elements to become ready.
const READY_POLL: Duration = Duration::from_millis(25);
/// Reference element drift beyond this triggers a corrective seek.
pub const DRIFT_THRESHOLD: TimeUs = TimeUs(100_000);
/// Stop seeking the reference element this close to its end, so a backend
/// that loops on reaching end-of-media never snaps back to zero mid-export.
pub const END_HOLD_MARGIN: TimeUs = TimeUs(100_000);
/// Publish progress every this many frames (and always on the last).
const PROGRESS_EVERY: u64 = 10;

// ---------------------------------------------------------------------------
// ExportPhase / CancelHandle
// ---------------------------------------------------------------------------

/// Lifecycle of one export run. Phases only ever advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportPhase {
    #[default]
    Idle,
    Preloading,
    Recording,
    Finalizing,
    Done,
    Failed,
    Cancelled,
}

/// Shared cancellation flag, checked once per frame and during preload.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

pub struct Exporter {
    backend: Box<dyn ExportBackend>,
    phase_tx: watch::Sender<ExportPhase>,
}

impl Exporter {
    pub fn new(backend: Box<dyn ExportBackend>) -> Self {
        let (phase_tx, _) = watch::channel(ExportPhase::Idle);
        Self { backend, phase_tx }
    }

    /// Observe phase transitions of the current/next run.
    pub fn phase(&self) -> watch::Receiver<ExportPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&self, phase: ExportPhase) {
        debug!(?phase, "export phase");
        let _ = self.phase_tx.send(phase);
    }

    /// Run a full export of `snapshot` and return the finalized blob.
    ///
    /// On any error the encoder is aborted and all session resources are
    /// released; partial output is never returned. Cancellation takes
    /// effect at the next frame boundary.
    pub async fn export(
        &mut self,
        snapshot: &ProjectSnapshot,
        config: &ExportConfig,
        progress: &watch::Sender<ExportProgress>,
        cancel: &CancelHandle,
    ) -> Result<EncodedBlob> {
        let config = config.sanitized();
        let job = Uuid::new_v4();
        let wall_start = Instant::now();
        info!(%job, fps = config.fps, timeline_us = snapshot.duration_us.0, "export starting");

        let result = self.run(snapshot, &config, progress, cancel).await;
        let elapsed_ms = wall_start.elapsed().as_millis() as u64;
        match &result {
            Ok(blob) => {
                info!(
                    %job,
                    elapsed_ms,
                    bytes = blob.bytes.len(),
                    duration_us = ?blob.duration_us,
                    "export finished"
                );
                self.set_phase(ExportPhase::Done);
            }
            Err(ExportError::Cancelled) => {
                info!(%job, elapsed_ms, "export cancelled");
                self.set_phase(ExportPhase::Cancelled);
            }
            Err(e) => {
                warn!(%job, elapsed_ms, error = %e, "export failed");
                self.set_phase(ExportPhase::Failed);
            }
        }
        result
    }

    async fn run(
        &mut self,
        snapshot: &ProjectSnapshot,
        config: &ExportConfig,
        progress: &watch::Sender<ExportProgress>,
        cancel: &CancelHandle,
    ) -> Result<EncodedBlob> {
        if snapshot.duration_us <= TimeUs::ZERO {
            return Err(ExportError::EmptyTimeline);
        }

        self.set_phase(ExportPhase::Preloading);
        let mut session = self.preload(snapshot, cancel).await?;

        let outcome = self
            .record(snapshot, config, &mut session, progress, cancel)
            .await;
        session.release();
        outcome
    }

    /// Open and ready every clip's media element, then wire up audio.
    async fn preload(
        &mut self,
        snapshot: &ProjectSnapshot,
        cancel: &CancelHandle,
    ) -> Result<ExportSession> {
        let mut elements: HashMap<Uuid, Box<dyn MediaElement>> = HashMap::new();
        for clip in &snapshot.clips {
            let media = snapshot
                .media_item(clip.media_id)
                .ok_or(ExportError::MediaNotFound(clip.media_id))?;
            let mut element = self.backend.open_media(media)?;
            element.pause();
            element.set_muted(true);
            element.set_looping(false);
            elements.insert(clip.id, element);
        }
        debug!(count = elements.len(), "media elements opened");

        if timeout(PRELOAD_TIMEOUT, wait_all_ready(&elements, cancel))
            .await
            .is_err()
        {
            let stuck = elements
                .values()
                .find(|e| !e.is_ready())
                .map(|e| e.media_id())
                .unwrap_or_default();
            return Err(ExportError::PreloadTimeout(stuck));
        }
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let mut mixer = AudioMixer::new(self.backend.create_audio_backend());
        mixer.initialize()?;
        for clip in &snapshot.clips {
            match snapshot.clip_kind(clip) {
                Some(MediaKind::Video) | Some(MediaKind::Audio) => {
                    mixer.add_source(clip.id, 1.0)?;
                }
                _ => {}
            }
        }
        debug!(sources = mixer.source_count(), "audio graph wired");

        Ok(ExportSession {
            elements,
            mixer,
            released: false,
        })
    }

    async fn record(
        &mut self,
        snapshot: &ProjectSnapshot,
        config: &ExportConfig,
        session: &mut ExportSession,
        progress: &watch::Sender<ExportProgress>,
        cancel: &CancelHandle,
    ) -> Result<EncodedBlob> {
        self.set_phase(ExportPhase::Recording);
        let mut surface = self.backend.create_surface(config.width, config.height)?;
        let mut encoder = self.backend.create_encoder(config)?;
        encoder.start(config.fps)?;
        // The mixer graph only carries sound from playing elements.
        session.start_playback(snapshot);

        match record_frames(
            snapshot,
            config,
            session,
            surface.as_mut(),
            encoder.as_mut(),
            progress,
            cancel,
        )
        .await
        {
            Ok(()) => {
                self.set_phase(ExportPhase::Finalizing);
                let mut blob = encoder.stop()?;
                // Streamed containers come back without duration metadata.
                // A failed repair degrades to the raw blob rather than
                // failing the whole run.
                if let Err(e) = encoder.repair_duration(&mut blob, snapshot.duration_us) {
                    warn!(error = %e, "duration repair failed, returning raw blob");
                }
                Ok(blob)
            }
            Err(e) => {
                encoder.abort();
                Err(e)
            }
        }
    }
}

/// Poll until every element reports ready. Cancellation ends the wait early.
async fn wait_all_ready(elements: &HashMap<Uuid, Box<dyn MediaElement>>, cancel: &CancelHandle) {
    loop {
        if cancel.is_cancelled() || elements.values().all(|e| e.is_ready()) {
            return;
        }
        sleep(READY_POLL).await;
    }
}

/// The paced recording loop.
///
/// `current` for frame `i` is exactly `i / fps`; the wall clock never feeds
/// into it. Pacing sleeps until the ideal wall time of the next frame, so a
/// frame that rendered slow is followed by no sleep at all rather than a
/// skipped frame.
async fn record_frames(
    snapshot: &ProjectSnapshot,
    config: &ExportConfig,
    session: &mut ExportSession,
    surface: &mut dyn RenderSurface,
    encoder: &mut dyn StreamingEncoder,
    progress: &watch::Sender<ExportProgress>,
    cancel: &CancelHandle,
) -> Result<()> {
    let total = total_frames(snapshot.duration_us, config.fps);
    let mut renderer = FrameRenderer::new();
    let mut clock = snapshot.first_video_clip().map(ReferenceClock::new);
    let started = Instant::now();
    info!(total, fps = config.fps, "recording");

    for frame in 0..total {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        let current = frame_time(frame, config.fps);

        if let Some(clock) = clock.as_mut() {
            clock.pin(&mut session.elements, current);
        }
        let pinned = clock.as_ref().map(|c| c.clip_id);
        renderer.render(snapshot, &mut session.elements, current, pinned, surface);
        encoder.capture_frame(surface)?;

        if frame % PROGRESS_EVERY == 0 || frame + 1 == total {
            let done = frame + 1;
            let _ = progress.send(ExportProgress {
                percent: done as f64 / total as f64 * 100.0,
                frame: done,
                total_frames: total,
            });
        }

        let next = started + Duration::from_micros((frame + 1) * 1_000_000 / config.fps as u64);
        sleep_until(next).await;
    }

    if renderer.skipped_draws() > 0 {
        warn!(skipped = renderer.skipped_draws(), "draws skipped during export");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ReferenceClock
// ---------------------------------------------------------------------------

/// Keeps the first video clip's element pinned to the simulated clock.
///
/// The audio graph plays from that element in real time, so it is the one
/// place wall-clock playback and the simulated clock must agree. Seeks are
/// corrective only (drift past [`DRIFT_THRESHOLD`]), never backward, and
/// stop inside [`END_HOLD_MARGIN`] of the media's end.
struct ReferenceClock {
    clip_id: Uuid,
    start_us: TimeUs,
    trim_in_us: TimeUs,
    trim_out_us: TimeUs,
    last_target_us: TimeUs,
}

impl ReferenceClock {
    fn new(clip: &TimelineClip) -> Self {
        Self {
            clip_id: clip.id,
            start_us: clip.start_us,
            trim_in_us: clip.trim_in_us,
            trim_out_us: clip.trim_out_us,
            last_target_us: TimeUs::ZERO,
        }
    }

    fn pin(&mut self, elements: &mut HashMap<Uuid, Box<dyn MediaElement>>, current: TimeUs) {
        let Some(element) = elements.get_mut(&self.clip_id) else {
            return;
        };
        let target =
            (self.trim_in_us + (current - self.start_us)).clamp(self.trim_in_us, self.trim_out_us);

        if target < self.last_target_us {
            debug!(?target, "suppressing backward reference seek");
            return;
        }
        if target >= element.duration_us() - END_HOLD_MARGIN {
            // Hold: seeking at the very end can trip loop-to-start behavior
            // in the playback backend.
            return;
        }

        let drift = TimeUs((element.position_us() - target).0.abs());
        if drift > DRIFT_THRESHOLD {
            if let Err(e) = element.seek(target) {
                warn!(error = %e, "reference clock seek failed");
                return;
            }
        }
        self.last_target_us = target;
    }
}

// ---------------------------------------------------------------------------
// ExportSession
// ---------------------------------------------------------------------------

/// Per-run resources. `release` is idempotent and always runs, success or
/// failure, before the run returns.
struct ExportSession {
    elements: HashMap<Uuid, Box<dyn MediaElement>>,
    mixer: AudioMixer,
    released: bool,
}

impl ExportSession {
    /// Resume playback on every element wired into the audio graph. Images
    /// stay paused; they have no stream to run.
    fn start_playback(&mut self, snapshot: &ProjectSnapshot) {
        for clip in &snapshot.clips {
            if matches!(
                snapshot.clip_kind(clip),
                Some(MediaKind::Video) | Some(MediaKind::Audio)
            ) {
                if let Some(element) = self.elements.get_mut(&clip.id) {
                    element.play();
                }
            }
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        for element in self.elements.values_mut() {
            element.pause();
        }
        self.elements.clear();
        self.mixer.cleanup();
        debug!("export session released");
    }
}

impl Drop for ExportSession {
    fn drop(&mut self) {
        self.release();
    }
}
