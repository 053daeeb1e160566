//! yt-dlp driver
//!
//! Spawns the external tool in metadata-simulation mode and builds the
//! format model from its JSON output. The tool may keep writing after it
//! has emitted the metadata record, so the retriever reads exactly one
//! JSON object, closes the stream and terminates the process itself.

use crate::extractor::models::VideoInfo;
use crate::session::terminate;
use crate::session::DownloadSession;
use crate::utils::config::ToolConfig;
use crate::utils::error::TubeloaderError;
use crate::utils::locate;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{debug, info, warn};

/// Grace period before force-killing a tool that lingers after its JSON
/// payload has been captured.
const METADATA_KILL_GRACE: Duration = Duration::from_secs(5);

/// Handle to a configured external download tool
#[derive(Debug, Clone)]
pub struct YtDlp {
    tool_path: PathBuf,
}

impl YtDlp {
    /// Wrap an explicit executable path.
    pub fn new(tool_path: impl Into<PathBuf>) -> Result<Self, TubeloaderError> {
        let tool_path = tool_path.into();
        if tool_path.as_os_str().is_empty() {
            return Err(TubeloaderError::ToolNotConfigured);
        }
        Ok(Self { tool_path })
    }

    /// Resolve the tool from the persisted configuration first, then by
    /// discovery along the usual install locations.
    pub fn from_environment() -> Result<Self, TubeloaderError> {
        if let Some(path) = ToolConfig::load().valid_tool_path() {
            info!("using configured tool at {}", path.display());
            return Self::new(path);
        }
        match locate::locate_tool(locate::TOOL_NAME) {
            Some(path) => Self::new(path),
            None => Err(TubeloaderError::ToolNotConfigured),
        }
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    /// Query the tool's version string.
    pub async fn version(&self) -> Result<String, TubeloaderError> {
        let output = terminate::tool_command(&self.tool_path)
            .arg("--version")
            .output()
            .await?;

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if version.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                return Err(TubeloaderError::ToolExecution(
                    "tool produced no version output".to_string(),
                ));
            }
            return Err(TubeloaderError::ToolExecution(stderr));
        }
        Ok(version)
    }

    /// Retrieve metadata for `url` without downloading anything.
    ///
    /// Runs the tool in quiet simulate mode, peeks the first byte of its
    /// stdout and parses a single JSON object. Whatever the tool does
    /// afterwards, it is terminated within a bounded grace period.
    pub async fn fetch_info(&self, url: &str) -> Result<VideoInfo, TubeloaderError> {
        debug!("fetching metadata for {}", url);

        let mut child = terminate::tool_command(&self.tool_path)
            .arg("--no-warnings")
            .arg("--simulate")
            .arg("--no-call-home")
            .arg("--dump-json")
            .arg(url)
            .spawn()?;

        // Drain stderr concurrently so the tool can never block on a full
        // pipe; the captured text becomes the error message on failure.
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut text = String::new();
            if let Some(stderr) = stderr {
                let _ = BufReader::new(stderr).read_to_string(&mut text).await;
            }
            text
        });

        let stdout = child.stdout.take().ok_or_else(|| {
            TubeloaderError::ToolExecution("tool stdout was not captured".to_string())
        })?;
        let mut reader = BufReader::new(stdout);

        // None = no output at all, Some(line) = the JSON record
        let outcome: Result<Option<String>, TubeloaderError> = async {
            let peeked = {
                let buffered = reader.fill_buf().await?;
                buffered.first().copied()
            };
            match peeked {
                None => Ok(None),
                Some(b'{') => {
                    let mut line = String::new();
                    reader.read_line(&mut line).await?;
                    Ok(Some(line))
                }
                Some(other) => Err(TubeloaderError::MalformedMetadata(format!(
                    "expected a JSON object, got leading byte {:#04x}",
                    other
                ))),
            }
        }
        .await;

        drop(reader);
        if let Err(err) = terminate::shutdown(&mut child, METADATA_KILL_GRACE).await {
            warn!("failed to shut down metadata process: {}", err);
        }
        let captured_stderr = stderr_task.await.unwrap_or_default();

        match outcome? {
            Some(document) => VideoInfo::from_document(&document),
            None => {
                let stderr = captured_stderr.trim();
                if stderr.is_empty() {
                    Err(TubeloaderError::ToolExecution(
                        "tool produced no output".to_string(),
                    ))
                } else {
                    Err(TubeloaderError::ToolExecution(stderr.to_string()))
                }
            }
        }
    }

    /// Prepare a single-use download session for one of the video's formats.
    ///
    /// Live streams are rejected outright, and the video must carry a
    /// homepage URL since that is what the tool downloads from.
    pub fn prepare_download(
        &self,
        info: &VideoInfo,
        format_id: &str,
    ) -> Result<DownloadSession, TubeloaderError> {
        if info.is_live_stream {
            return Err(TubeloaderError::LiveStreamUnsupported);
        }
        let format = info
            .format_by_id(format_id)
            .ok_or_else(|| TubeloaderError::UnknownFormat(format_id.to_string()))?;
        let homepage = info.homepage_url.clone().ok_or_else(|| {
            TubeloaderError::MalformedMetadata(
                "video has no homepage URL to download from".to_string(),
            )
        })?;

        Ok(DownloadSession::new(
            self.tool_path.clone(),
            format.clone(),
            homepage,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::models::VideoInfo;

    fn sample_info(live: bool, homepage: Option<&str>) -> VideoInfo {
        let doc = format!(
            r#"{{"id": "x", "fulltitle": "t", "is_live": {},
                {} "formats": [{{"format_id": "22", "protocol": "https",
                "vcodec": "avc1.64001f", "acodec": "mp4a.40.2"}}]}}"#,
            live,
            homepage
                .map(|h| format!(r#""webpage_url": "{}","#, h))
                .unwrap_or_default(),
        );
        VideoInfo::from_document(&doc).unwrap()
    }

    #[test]
    fn test_empty_tool_path_is_rejected() {
        let err = YtDlp::new("").unwrap_err();
        assert!(matches!(err, TubeloaderError::ToolNotConfigured));
    }

    #[test]
    fn test_prepare_rejects_live_streams() {
        let tool = YtDlp::new("/usr/bin/yt-dlp").unwrap();
        let info = sample_info(true, Some("https://example.com/watch"));
        let err = tool.prepare_download(&info, "22").unwrap_err();
        assert!(matches!(err, TubeloaderError::LiveStreamUnsupported));
    }

    #[test]
    fn test_prepare_rejects_unknown_format() {
        let tool = YtDlp::new("/usr/bin/yt-dlp").unwrap();
        let info = sample_info(false, Some("https://example.com/watch"));
        let err = tool.prepare_download(&info, "nope").unwrap_err();
        assert!(matches!(err, TubeloaderError::UnknownFormat(id) if id == "nope"));
    }

    #[test]
    fn test_prepare_requires_homepage() {
        let tool = YtDlp::new("/usr/bin/yt-dlp").unwrap();
        let info = sample_info(false, None);
        let err = tool.prepare_download(&info, "22").unwrap_err();
        assert!(matches!(err, TubeloaderError::MalformedMetadata(_)));
    }
}
