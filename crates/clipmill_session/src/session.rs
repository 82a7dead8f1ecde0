//! Editing session orchestration.
//!
//! Owns the project model and the export engine, gates edits while an
//! export is running, and pushes finished exports to an upload sink.

use crate::intent::EditIntent;
use crate::preview::PreviewClock;
use clipmill_core::model::Project;
use clipmill_export::encoder::{EncodedBlob, ExportConfig, ExportProgress};
use clipmill_export::exporter::{CancelHandle, Exporter};
use clipmill_export::ExportError;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("an export is already in progress")]
    ExportInFlight,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Destination for finished exports. Returns the remote location of the
/// stored blob.
pub trait UploadSink {
    fn upload(&mut self, name: &str, blob: &EncodedBlob) -> Result<String>;
}

/// One open project plus its export machinery.
///
/// While an export is running the timeline is frozen: edits are dropped
/// with a warning instead of mutating state the exporter already
/// snapshotted. Transport intents (playhead, play/pause) stay live.
pub struct EditorSession {
    project: Project,
    exporter: Exporter,
    export_in_flight: bool,
    progress_tx: watch::Sender<ExportProgress>,
    preview: PreviewClock,
}

impl EditorSession {
    pub fn new(project: Project, exporter: Exporter) -> Self {
        let (progress_tx, _) = watch::channel(ExportProgress::default());
        Self {
            project,
            exporter,
            export_in_flight: false,
            progress_tx,
            preview: PreviewClock::new(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn export_in_flight(&self) -> bool {
        self.export_in_flight
    }

    /// Observe export progress across runs.
    pub fn progress(&self) -> watch::Receiver<ExportProgress> {
        self.progress_tx.subscribe()
    }

    /// Drive preview playback against wall time.
    pub fn tick_preview(&mut self, now: std::time::Instant) {
        self.preview.tick(&mut self.project, now);
    }

    /// Apply one edit to the project. Returns the id of whatever the edit
    /// created, where that makes sense.
    ///
    /// Timeline edits during an export are rejected as no-ops.
    pub fn apply(&mut self, intent: EditIntent) -> Option<Uuid> {
        if self.export_in_flight && !intent_is_transport(&intent) {
            warn!(?intent, "edit rejected: export in progress");
            return None;
        }
        match intent {
            EditIntent::AddMedia {
                name,
                kind,
                source,
                probe,
            } => Some(self.project.add_media(name, kind, source, probe)),
            EditIntent::AddTextOverlay(overlay) => Some(self.project.add_text_overlay(overlay)),
            EditIntent::AddStickerOverlay(overlay) => {
                Some(self.project.add_sticker_overlay(overlay))
            }
            EditIntent::PlaceOnTrack {
                media_id,
                track,
                start_us,
            } => self.project.place_on_track(media_id, track, start_us),
            EditIntent::MoveOrResize { id, edge, delta_us } => {
                self.project.move_or_resize(id, edge, delta_us);
                None
            }
            EditIntent::SplitAt { id, at_us } => {
                self.project.split_at(id, at_us).map(|(_, right)| right)
            }
            EditIntent::Duplicate { id } => self.project.duplicate(id),
            EditIntent::Select { id } => {
                self.project.select(id);
                None
            }
            EditIntent::DeleteSelected => {
                self.project.delete_selected();
                None
            }
            EditIntent::SetPlayhead { at_us } => {
                self.project.set_playhead(at_us);
                None
            }
            EditIntent::SetPlaying { playing } => {
                self.project.set_playing(playing);
                None
            }
        }
    }

    /// Export the current timeline and hand the blob to `sink`. Returns the
    /// uploaded location.
    ///
    /// Only one export may run per session at a time.
    pub async fn export_and_upload<S: UploadSink>(
        &mut self,
        config: &ExportConfig,
        sink: &mut S,
        cancel: &CancelHandle,
    ) -> Result<String> {
        if self.export_in_flight {
            return Err(SessionError::ExportInFlight);
        }
        self.export_in_flight = true;
        self.project.set_playing(false);

        let snapshot = self.project.snapshot();
        let result = self
            .exporter
            .export(&snapshot, config, &self.progress_tx, cancel)
            .await;
        self.export_in_flight = false;

        let blob = result?;
        let name = format!("{}.webm", self.project.name);
        let location = sink.upload(&name, &blob)?;
        info!(%location, bytes = blob.bytes.len(), "export uploaded");
        Ok(location)
    }
}

/// Transport intents control playback only and never touch timeline state
/// the exporter cares about.
fn intent_is_transport(intent: &EditIntent) -> bool {
    matches!(
        intent,
        EditIntent::SetPlayhead { .. } | EditIntent::SetPlaying { .. } | EditIntent::Select { .. }
    )
}
