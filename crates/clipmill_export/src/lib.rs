//! Frame-accurate timeline export.
//!
//! Takes a [`clipmill_core`] project snapshot and records it into a single
//! encoded video: every frame is composed for a simulated time derived
//! purely from its index, audio sources are mixed into one track, and the
//! first video clip's element acts as the audio reference clock. All
//! platform specifics (decoders, raster surfaces, audio graphs, container
//! encoders) live behind the traits in [`backend`].

pub mod backend;
pub mod encoder;
pub mod error;
pub mod exporter;
pub mod mixer;
pub mod renderer;

#[cfg(test)]
mod testutil;

pub use encoder::{EncodedBlob, ExportConfig, ExportProgress, Quality};
pub use error::{ExportError, Result};
pub use exporter::{CancelHandle, ExportPhase, Exporter};
