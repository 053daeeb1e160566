//! Data structures for video metadata
//!
//! `VideoInfo` and `VideoFormat` are immutable value objects built from the
//! tool's JSON metadata document. The wire shape is deserialized into raw
//! serde structs and then validated into the model, so schema violations
//! surface as `MalformedMetadata` instead of leaking half-built values.

use crate::utils::error::TubeloaderError;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// One video as described by the tool's metadata document
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub uploader_name: String,
    pub duration_seconds: u64,
    /// Upload time as unix seconds (0 when the document carries none)
    pub upload_timestamp: i64,
    pub is_live_stream: bool,
    /// The video's web page; required later as the download target
    pub homepage_url: Option<String>,
    /// Thumbnail URLs in source order
    pub thumbnails: Vec<String>,
    /// Formats in source order; may be empty
    pub formats: Vec<VideoFormat>,
}

impl VideoInfo {
    /// Upload time as a calendar date, when the document carried one.
    pub fn upload_date(&self) -> Option<DateTime<Utc>> {
        if self.upload_timestamp == 0 {
            return None;
        }
        Utc.timestamp_opt(self.upload_timestamp, 0).single()
    }

    /// Look up a format by its id.
    pub fn format_by_id(&self, format_id: &str) -> Option<&VideoFormat> {
        self.formats.iter().find(|f| f.format_id == format_id)
    }

    /// Parse exactly one JSON object from `document`, ignoring any trailing
    /// content the tool may have emitted after the record.
    pub fn from_document(document: &str) -> Result<Self, TubeloaderError> {
        let mut stream = serde_json::Deserializer::from_str(document).into_iter::<RawVideoInfo>();
        let raw = match stream.next() {
            Some(Ok(raw)) => raw,
            Some(Err(err)) => return Err(TubeloaderError::MalformedMetadata(err.to_string())),
            None => {
                return Err(TubeloaderError::MalformedMetadata(
                    "empty metadata document".to_string(),
                ))
            }
        };
        raw.into_model()
    }
}

/// One downloadable rendition of a video
#[derive(Debug, Clone)]
pub struct VideoFormat {
    /// Unique within the owning video's format list
    pub format_id: String,
    pub file_extension: String,
    pub format_note: Option<String>,
    /// Transport protocol, e.g. "https" or a streaming protocol name
    pub protocol: String,
    /// None means the format carries no video stream
    pub video_codec: Option<String>,
    /// None means the format carries no audio stream
    pub audio_codec: Option<String>,
    /// 0 when there is no video stream
    pub video_width: u32,
    /// 0 when there is no video stream
    pub video_height: u32,
    pub fps: Option<u32>,
    pub bitrate_kbps: f64,
    pub audio_bitrate_kbps: Option<u32>,
    pub audio_sample_rate: Option<u32>,
    pub file_size_bytes: Option<u64>,
    pub direct_url: Option<String>,
}

/// Which media streams a format carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Combined,
    VideoOnly,
    AudioOnly,
}

impl VideoFormat {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }

    /// Classify the format. Parsing guarantees at least one stream.
    pub fn kind(&self) -> FormatKind {
        match (self.has_video(), self.has_audio()) {
            (true, true) => FormatKind::Combined,
            (true, false) => FormatKind::VideoOnly,
            (false, _) => FormatKind::AudioOnly,
        }
    }

    /// True for adaptive/streaming protocols that need MPEG-TS handling.
    pub fn is_streaming_protocol(&self) -> bool {
        !self.protocol.eq_ignore_ascii_case("http") && !self.protocol.eq_ignore_ascii_case("https")
    }
}

// Formats are identified by id within their owning video.
impl PartialEq for VideoFormat {
    fn eq(&self, other: &Self) -> bool {
        self.format_id == other.format_id
    }
}

impl Eq for VideoFormat {}

// ============================================================
// Wire shapes
// ============================================================

#[derive(Debug, Deserialize)]
struct RawVideoInfo {
    #[serde(default)]
    id: String,
    // The tool emits both; "fulltitle" is the unabridged one.
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    fulltitle: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    is_live: Option<bool>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    #[serde(default)]
    format_id: Option<String>,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    format_note: Option<String>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    fps: Option<f64>,
    #[serde(default)]
    tbr: Option<f64>,
    #[serde(default)]
    abr: Option<f64>,
    #[serde(default)]
    asr: Option<u32>,
    #[serde(default)]
    filesize: Option<u64>,
    #[serde(default)]
    url: Option<String>,
}

/// The tool writes "none" (or omits the key) for an absent stream.
fn codec_or_none(codec: Option<String>) -> Option<String> {
    match codec {
        Some(value) if !value.is_empty() && !value.eq_ignore_ascii_case("none") => Some(value),
        _ => None,
    }
}

fn string_or_none(value: Option<String>) -> Option<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Some(text),
        _ => None,
    }
}

impl RawVideoInfo {
    fn into_model(self) -> Result<VideoInfo, TubeloaderError> {
        let formats = self
            .formats
            .into_iter()
            .map(RawFormat::into_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(VideoInfo {
            id: self.id,
            title: self.fulltitle.or(self.title).unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            uploader_name: self.uploader.unwrap_or_default(),
            duration_seconds: self.duration.map(|d| d.max(0.0) as u64).unwrap_or(0),
            upload_timestamp: self.timestamp.unwrap_or(0),
            is_live_stream: self.is_live.unwrap_or(false),
            homepage_url: string_or_none(self.webpage_url),
            thumbnails: self.thumbnails.into_iter().filter_map(|t| t.url).collect(),
            formats,
        })
    }
}

impl RawFormat {
    fn into_model(self) -> Result<VideoFormat, TubeloaderError> {
        let format_id = self.format_id.unwrap_or_default();
        let video_codec = codec_or_none(self.vcodec);
        let audio_codec = codec_or_none(self.acodec);

        if video_codec.is_none() && audio_codec.is_none() {
            return Err(TubeloaderError::MalformedMetadata(format!(
                "format '{}' has neither a video nor an audio stream",
                format_id
            )));
        }

        // Dimensions only make sense with a video stream.
        let (video_width, video_height) = if video_codec.is_some() {
            (self.width.unwrap_or(0), self.height.unwrap_or(0))
        } else {
            (0, 0)
        };
        let audio_sample_rate = if audio_codec.is_some() { self.asr } else { None };

        Ok(VideoFormat {
            format_id,
            file_extension: self.ext.unwrap_or_default(),
            format_note: string_or_none(self.format_note),
            protocol: self.protocol.unwrap_or_default(),
            video_codec,
            audio_codec,
            video_width,
            video_height,
            fps: self.fps.map(|f| f.round() as u32),
            bitrate_kbps: self.tbr.unwrap_or(0.0),
            audio_bitrate_kbps: self.abr.map(|a| a.round() as u32),
            audio_sample_rate,
            file_size_bytes: self.filesize,
            direct_url: string_or_none(self.url),
        })
    }
}

// ============================================================
// Tests
// ============================================================
