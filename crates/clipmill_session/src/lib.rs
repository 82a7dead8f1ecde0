//! Session layer tying the timeline model to the export engine.
//!
//! A host UI talks to [`session::EditorSession`]: it feeds
//! [`intent::EditIntent`]s in, ticks the preview clock, and kicks off
//! export-and-upload runs against whatever [`session::UploadSink`] backs
//! the deployment.

pub mod intent;
pub mod preview;
pub mod session;
pub mod telemetry;

pub use intent::EditIntent;
pub use preview::PreviewClock;
pub use session::{EditorSession, SessionError, UploadSink};
