use thiserror::Error;
use uuid::Uuid;

/// Failures of a backing media element (offscreen video/image handle).
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media source unavailable: {0}")]
    Unavailable(String),

    #[error("seek failed: {0}")]
    Seek(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Failures of the audio graph backend.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio graph unavailable: {0}")]
    GraphUnavailable(String),

    #[error("audio mixer already initialized")]
    AlreadyInitialized,

    #[error("audio mixer not initialized")]
    NotInitialized,

    #[error("media element {0} is already wrapped by a source node")]
    SourceAlreadyWrapped(Uuid),
}

/// Failures of the streaming encoder or its capture surface.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("capture surface unavailable: {0}")]
    Surface(String),

    #[error("encoder failed to start: {0}")]
    Start(String),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("encoder failed to finalize: {0}")]
    Finalize(String),

    #[error("duration repair failed: {0}")]
    DurationRepair(String),
}

/// Top-level export failure. Any variant except `Cancelled` means the run
/// hit an unrecoverable error; partial output is never returned.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: timeline is empty")]
    EmptyTimeline,

    #[error("media {0} referenced by a clip is not in the library")]
    MediaNotFound(Uuid),

    #[error("preload timed out for media {0}")]
    PreloadTimeout(Uuid),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("export cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ExportError>;
