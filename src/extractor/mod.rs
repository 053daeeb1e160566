pub mod models;
pub mod ranking;
pub mod ytdlp;

pub use models::{FormatKind, VideoFormat, VideoInfo};
pub use ranking::{
    compare_quality, format_priority, friendly_label, group_for_display, sort_best_first,
    FormatGroups,
};
pub use ytdlp::YtDlp;
