//! Tubeloader - yt-dlp front-end
//!
//! Resolves the external download tool, fetches video metadata, presents
//! the available formats best-first and runs a supervised download with
//! live progress. Ctrl-C cancels the running download gracefully.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tubeloader::extractor::ranking;
use tubeloader::{
    MetadataCache, SessionOutcome, StartOptions, ToolConfig, VideoFormat, VideoInfo, YtDlp,
};

#[derive(Parser)]
#[command(name = "tubeloader", version, about = "Download videos via an external yt-dlp compatible tool")]
struct Args {
    /// Video page URL
    url: String,

    /// Print the available formats and exit
    #[arg(long)]
    list_formats: bool,

    /// Format id to download (defaults to the best-ranked format)
    #[arg(short, long)]
    format: Option<String>,

    /// Destination file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Ask the tool to skip post-processing fixups
    #[arg(long)]
    no_fixup: bool,

    /// Path to the downloader executable (persisted for later runs)
    #[arg(long)]
    tool: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let tool = resolve_tool(&args)?;

    let mut cache = MetadataCache::new();
    let info = fetch_cached(&tool, &mut cache, &args.url).await?;

    println!("{} - {}", info.title, info.uploader_name);
    if info.duration_seconds > 0 {
        println!(
            "duration {}:{:02}",
            info.duration_seconds / 60,
            info.duration_seconds % 60
        );
    }

    if args.list_formats {
        print_formats(&info);
        return Ok(());
    }

    let format = select_format(&info, args.format.as_deref())?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&info, format));
    println!(
        "downloading format {} ({}) to {}",
        format.format_id,
        ranking::friendly_label(format),
        output.display()
    );

    let session = Arc::new(tool.prepare_download(&info, &format.format_id)?);
    let mut progress = session
        .progress_stream()
        .context("progress stream already taken")?;
    let completion = session
        .completion()
        .context("completion future already taken")?;

    session.start(&output, StartOptions { no_fixup: args.no_fixup })?;

    // Ctrl-C requests a graceful cancel; the session handles the rest.
    let canceller = Arc::clone(&session);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ncancelling...");
            canceller.cancel();
        }
    });

    while let Some(percent) = progress.recv().await {
        print!("\r{:5.1}%", percent);
        let _ = std::io::stdout().flush();
    }
    println!();

    let outcome = completion
        .await
        .context("session ended without a terminal notification")?;
    report_outcome(outcome)
}

/// An explicit --tool wins and is persisted; otherwise the config file,
/// then discovery.
fn resolve_tool(args: &Args) -> Result<YtDlp> {
    if let Some(path) = &args.tool {
        let mut config = ToolConfig::load();
        config.tool_path = Some(path.clone());
        if let Err(err) = config.save() {
            warn!("could not persist tool path: {}", err);
        }
        return Ok(YtDlp::new(path.clone())?);
    }
    Ok(YtDlp::from_environment()?)
}

async fn fetch_cached(tool: &YtDlp, cache: &mut MetadataCache, url: &str) -> Result<VideoInfo> {
    if let Some(info) = cache.get(url) {
        return Ok(info.clone());
    }
    let info = tool.fetch_info(url).await?;
    cache.put(url, info.clone());
    Ok(info)
}

fn select_format<'a>(info: &'a VideoInfo, wanted: Option<&str>) -> Result<&'a VideoFormat> {
    if let Some(id) = wanted {
        return info
            .format_by_id(id)
            .with_context(|| format!("no format with id '{}'", id));
    }

    // Best-ranked format overall, preferring the combined bucket.
    let groups = ranking::group_for_display(&info.formats);
    let best = groups
        .combined
        .first()
        .or_else(|| groups.video_only.first())
        .or_else(|| groups.audio_only.first())
        .context("the video has no downloadable formats")?;
    info.format_by_id(&best.format_id)
        .context("the video has no downloadable formats")
}

fn default_output(info: &VideoInfo, format: &VideoFormat) -> PathBuf {
    let title: String = info
        .title
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect();
    PathBuf::from(format!("{}-{}.{}", title, info.id, format.file_extension))
}

fn print_formats(info: &VideoInfo) {
    let groups = ranking::group_for_display(&info.formats);
    let buckets = [
        ("Video + audio", &groups.combined),
        ("Video only", &groups.video_only),
        ("Audio only", &groups.audio_only),
    ];
    for (heading, formats) in buckets {
        if formats.is_empty() {
            continue;
        }
        println!("{}:", heading);
        for format in formats {
            println!(
                "  {:>10}  {:<7} {}",
                format.format_id,
                ranking::friendly_label(format),
                describe(format)
            );
        }
    }
}

fn describe(format: &VideoFormat) -> String {
    if format.has_video() {
        let fps = format.fps.map(|f| format!(" @{}fps", f)).unwrap_or_default();
        format!(
            "{}x{}{} .{}",
            format.video_width, format.video_height, fps, format.file_extension
        )
    } else {
        let abr = format
            .audio_bitrate_kbps
            .map(|a| format!("{} kbps", a))
            .unwrap_or_else(|| "unknown bitrate".to_string());
        format!("{} .{}", abr, format.file_extension)
    }
}

fn report_outcome(outcome: SessionOutcome) -> Result<()> {
    if outcome.cancelled {
        println!("download cancelled");
        return Ok(());
    }
    if let Some(err) = outcome.error {
        anyhow::bail!("download failed: {}", err);
    }
    println!("saved to {}", outcome.destination.display());
    Ok(())
}
