pub mod download;
pub mod progress;
pub(crate) mod terminate;

pub use download::{DownloadSession, SessionOutcome, SessionState, StartOptions, TerminalState};
pub use progress::parse_progress_line;
