//! Audio mixing for export.
//!
//! N independently controlled media sources are funneled through one graph
//! into a single mixed output stream, so the encoded file carries exactly
//! one audio track no matter how many sources are active. The hidden media
//! elements used for frame timing stay muted; only this graph is audible.

use crate::backend::{AudioBackend, MixOutputHandle, SourceNodeId};
use crate::error::AudioError;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Owns the audio graph for one export session.
///
/// A media element may be wrapped by a source node at most once, so
/// `add_source` is idempotent per id: re-registering an id disconnects the
/// prior node first. `cleanup` is guarded and safe to call any number of
/// times, including when `initialize` never ran.
pub struct AudioMixer {
    backend: Box<dyn AudioBackend>,
    output: Option<MixOutputHandle>,
    sources: HashMap<Uuid, SourceNodeId>,
    master_volume: f64,
}

impl AudioMixer {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            output: None,
            sources: HashMap::new(),
            master_volume: 1.0,
        }
    }

    /// Build the audio graph and its stream-producing sink. Must be called
    /// once per export session; a second call is an error.
    pub fn initialize(&mut self) -> Result<MixOutputHandle, AudioError> {
        if self.output.is_some() {
            return Err(AudioError::AlreadyInitialized);
        }
        let handle = self.backend.create_graph()?;
        self.output = Some(handle);
        debug!(handle = handle.0, "audio graph initialized");
        Ok(handle)
    }

    /// Wrap a media element's audio output as a graph node with its own gain
    /// stage. Replacing an existing `id` disconnects the prior node first.
    pub fn add_source(&mut self, id: Uuid, volume: f64) -> Result<(), AudioError> {
        if self.output.is_none() {
            return Err(AudioError::NotInitialized);
        }
        if let Some(prior) = self.sources.remove(&id) {
            debug!(%id, "re-registering audio source, disconnecting prior node");
            self.backend.disconnect_source(prior);
        }
        let node = self.backend.create_source(id)?;
        self.backend.set_source_gain(node, volume.clamp(0.0, 1.0));
        self.sources.insert(id, node);
        Ok(())
    }

    /// Disconnect and forget a source. Safe to call on unknown ids.
    pub fn remove_source(&mut self, id: Uuid) {
        if let Some(node) = self.sources.remove(&id) {
            self.backend.disconnect_source(node);
        }
    }

    /// Scale the final mix stage. Clamped to [0, 1].
    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = volume.clamp(0.0, 1.0);
        if self.output.is_some() {
            self.backend.set_master_gain(self.master_volume);
        }
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    pub fn is_initialized(&self) -> bool {
        self.output.is_some()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Disconnect all sources and release the graph. Guarded no-op when the
    /// graph was never (or is no longer) alive.
    pub fn cleanup(&mut self) {
        if self.output.take().is_none() {
            return;
        }
        for (id, node) in self.sources.drain() {
            debug!(%id, "disconnecting audio source");
            self.backend.disconnect_source(node);
        }
        self.backend.destroy_graph();
    }
}

impl Drop for AudioMixer {
    fn drop(&mut self) {
        if self.output.is_some() {
            warn!("audio mixer dropped without cleanup; releasing graph");
            self.cleanup();
        }
    }
}
