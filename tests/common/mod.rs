//! Shared helpers for integration tests: fake download tools built from
//! shell scripts, and hand-rolled metadata fixtures.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tubeloader::{VideoFormat, VideoInfo};

/// Write an executable `#!/bin/sh` script that stands in for the tool.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write fake tool");

    let mut perms = std::fs::metadata(&path).expect("stat fake tool").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod fake tool");

    path
}

/// A minimal combined format.
pub fn sample_format(format_id: &str) -> VideoFormat {
    VideoFormat {
        format_id: format_id.to_string(),
        file_extension: "mp4".to_string(),
        format_note: Some("720p".to_string()),
        protocol: "https".to_string(),
        video_codec: Some("avc1.64001f".to_string()),
        audio_codec: Some("mp4a.40.2".to_string()),
        video_width: 1280,
        video_height: 720,
        fps: Some(30),
        bitrate_kbps: 1200.0,
        audio_bitrate_kbps: Some(128),
        audio_sample_rate: Some(44100),
        file_size_bytes: Some(10_000_000),
        direct_url: None,
    }
}

/// A video carrying one combined format and a homepage URL.
pub fn sample_info() -> VideoInfo {
    VideoInfo {
        id: "abc123".to_string(),
        title: "Sample Video".to_string(),
        description: String::new(),
        uploader_name: "Sample Uploader".to_string(),
        duration_seconds: 60,
        upload_timestamp: 0,
        is_live_stream: false,
        homepage_url: Some("https://example.com/watch?v=abc123".to_string()),
        thumbnails: Vec::new(),
        formats: vec![sample_format("22")],
    }
}
