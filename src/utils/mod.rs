//! Utility modules for error handling, configuration and tool discovery

pub mod config;
pub mod error;
pub mod locate;

// Re-export for convenience
pub use config::ToolConfig;
pub use error::TubeloaderError;
pub use locate::locate_tool;
