//! Tubeloader library
//!
//! Drives an external yt-dlp compatible tool: retrieves video metadata,
//! ranks the available formats and supervises download subprocesses with
//! live progress and cooperative cancellation.

pub mod cache;
pub mod extractor;
pub mod session;
pub mod utils;

// Re-export main types for easier use
pub use cache::MetadataCache;
pub use extractor::{FormatGroups, FormatKind, VideoFormat, VideoInfo, YtDlp};
pub use session::{DownloadSession, SessionOutcome, SessionState, StartOptions, TerminalState};
pub use utils::{ToolConfig, TubeloaderError};
