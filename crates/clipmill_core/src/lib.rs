//! Timeline model for the clipmill editor: media library, placed clips,
//! text/sticker overlays, and the derived playback state, mutated only
//! through named operations that keep the duration and trim invariants.

pub mod error;
pub mod model;
pub mod persist;
pub mod snapshot;
pub mod types;

pub use error::{CoreError, Result};
pub use model::Project;
pub use snapshot::ProjectSnapshot;
