//! Error handling for Tubeloader

use thiserror::Error;

/// Main error type for Tubeloader
#[derive(Debug, Error)]
pub enum TubeloaderError {
    #[error("no download tool configured. Install yt-dlp or set a path with --tool")]
    ToolNotConfigured,

    #[error("download tool failed: {0}")]
    ToolExecution(String),

    #[error("malformed metadata document: {0}")]
    MalformedMetadata(String),

    #[error("the download session has already been started")]
    AlreadyStarted,

    #[error("live streams are not supported")]
    LiveStreamUnsupported,

    #[error("the video has no format with id '{0}'")]
    UnknownFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
