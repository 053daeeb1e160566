//! Format classification and quality ranking
//!
//! Formats are grouped by a human-readable codec label and ordered by a
//! comparator whose ascending direction means "worse first". Presentation
//! code reverses it and buckets formats by the streams they carry.

use crate::extractor::models::{FormatKind, VideoFormat};
use std::cmp::Ordering;

/// Assumed frame rate when the document carries none
const DEFAULT_FPS: u32 = 30;

/// Human-readable codec label, derived from the video codec when present,
/// otherwise the audio codec. Used for grouping and as the primary ranking
/// key.
pub fn friendly_label(format: &VideoFormat) -> String {
    let codec = format
        .video_codec
        .as_deref()
        .or(format.audio_codec.as_deref())
        .unwrap_or("");

    if codec.eq_ignore_ascii_case("opus") {
        "Opus".to_string()
    } else if codec.eq_ignore_ascii_case("vorbis") {
        "Vorbis".to_string()
    } else if codec.eq_ignore_ascii_case("vp9") {
        "VP9".to_string()
    } else if codec.eq_ignore_ascii_case("vp8.0") || codec.eq_ignore_ascii_case("vp8") {
        "VP8".to_string()
    } else if starts_with_ignore_case(codec, "avc1") {
        "H264".to_string()
    } else if starts_with_ignore_case(codec, "av01") {
        "AV1".to_string()
    } else if starts_with_ignore_case(codec, "mp4a") {
        "M4A".to_string()
    } else {
        first_letter_upper(codec)
    }
}

/// Numeric codec priority; lower sorts first as "worse". Only a tie-break,
/// never the primary key within a label.
pub fn format_priority(format: &VideoFormat) -> i32 {
    let codec = format
        .video_codec
        .as_deref()
        .or(format.audio_codec.as_deref())
        .unwrap_or("");

    if codec.eq_ignore_ascii_case("opus") {
        -3
    } else if codec.eq_ignore_ascii_case("vorbis") {
        -5
    } else if codec.eq_ignore_ascii_case("vp9") {
        0
    } else if codec.eq_ignore_ascii_case("vp8.0") || codec.eq_ignore_ascii_case("vp8") {
        -2
    } else if starts_with_ignore_case(codec, "avc1") {
        -1
    } else if starts_with_ignore_case(codec, "mp4a") {
        -4
    } else {
        0
    }
}

/// Quality ordering, ascending = lower quality first.
///
/// Formats with different labels compare by codec priority alone. Within a
/// label, video-carrying formats compare by height, then frame rate, then
/// priority; audio-only formats compare by audio bitrate (missing bitrate
/// ranks lowest), then priority; a video-carrying format always outranks an
/// audio-only one.
pub fn compare_quality(a: &VideoFormat, b: &VideoFormat) -> Ordering {
    if friendly_label(a) != friendly_label(b) {
        return format_priority(a).cmp(&format_priority(b));
    }

    match (a.has_video(), b.has_video()) {
        (true, true) => a
            .video_height
            .cmp(&b.video_height)
            .then_with(|| a.fps.unwrap_or(DEFAULT_FPS).cmp(&b.fps.unwrap_or(DEFAULT_FPS)))
            .then_with(|| format_priority(a).cmp(&format_priority(b))),
        (false, false) => a
            .audio_bitrate_kbps
            .unwrap_or(0)
            .cmp(&b.audio_bitrate_kbps.unwrap_or(0))
            .then_with(|| format_priority(a).cmp(&format_priority(b))),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

/// Sort a format list best-first (the presentation order).
pub fn sort_best_first(formats: &mut [VideoFormat]) {
    formats.sort_by(|a, b| compare_quality(b, a));
}

/// Formats bucketed for presentation, each bucket sorted best-first
#[derive(Debug, Default)]
pub struct FormatGroups {
    pub combined: Vec<VideoFormat>,
    pub video_only: Vec<VideoFormat>,
    pub audio_only: Vec<VideoFormat>,
}

/// Partition formats into combined / video-only / audio-only buckets, in
/// that display priority, each internally sorted best-first.
pub fn group_for_display(formats: &[VideoFormat]) -> FormatGroups {
    let mut groups = FormatGroups::default();
    for format in formats {
        match format.kind() {
            FormatKind::Combined => groups.combined.push(format.clone()),
            FormatKind::VideoOnly => groups.video_only.push(format.clone()),
            FormatKind::AudioOnly => groups.audio_only.push(format.clone()),
        }
    }
    sort_best_first(&mut groups.combined);
    sort_best_first(&mut groups.video_only);
    sort_best_first(&mut groups.audio_only);
    groups
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

fn first_letter_upper(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn video(vcodec: &str, acodec: Option<&str>, height: u32, fps: Option<u32>) -> VideoFormat {
        VideoFormat {
            format_id: format!("{}-{}-{:?}", vcodec, height, fps),
            file_extension: "mp4".to_string(),
            format_note: None,
            protocol: "https".to_string(),
            video_codec: Some(vcodec.to_string()),
            audio_codec: acodec.map(str::to_string),
            video_width: height * 16 / 9,
            video_height: height,
            fps,
            bitrate_kbps: 0.0,
            audio_bitrate_kbps: None,
            audio_sample_rate: None,
            file_size_bytes: None,
            direct_url: None,
        }
    }

    fn audio(acodec: &str, abr: Option<u32>) -> VideoFormat {
        VideoFormat {
            format_id: format!("{}-{:?}", acodec, abr),
            file_extension: "webm".to_string(),
            format_note: None,
            protocol: "https".to_string(),
            video_codec: None,
            audio_codec: Some(acodec.to_string()),
            video_width: 0,
            video_height: 0,
            fps: None,
            bitrate_kbps: 0.0,
            audio_bitrate_kbps: abr,
            audio_sample_rate: Some(48000),
            file_size_bytes: None,
            direct_url: None,
        }
    }

    #[test]
    fn test_friendly_labels() {
        assert_eq!(friendly_label(&video("vp9", None, 1080, None)), "VP9");
        assert_eq!(friendly_label(&video("vp8.0", None, 360, None)), "VP8");
        assert_eq!(friendly_label(&video("VP8", None, 360, None)), "VP8");
        assert_eq!(friendly_label(&video("avc1.64001f", None, 720, None)), "H264");
        assert_eq!(friendly_label(&video("av01.0.08M.08", None, 720, None)), "AV1");
        assert_eq!(friendly_label(&audio("opus", Some(160))), "Opus");
        assert_eq!(friendly_label(&audio("vorbis", Some(128))), "Vorbis");
        assert_eq!(friendly_label(&audio("mp4a.40.2", Some(128))), "M4A");
        assert_eq!(friendly_label(&audio("flac", Some(900))), "Flac");
    }

    #[test]
    fn test_priorities() {
        assert_eq!(format_priority(&audio("opus", None)), -3);
        assert_eq!(format_priority(&audio("vorbis", None)), -5);
        assert_eq!(format_priority(&video("vp9", None, 0, None)), 0);
        assert_eq!(format_priority(&video("vp8", None, 0, None)), -2);
        assert_eq!(format_priority(&video("avc1.4d401e", None, 0, None)), -1);
        assert_eq!(format_priority(&audio("mp4a.40.2", None)), -4);
        assert_eq!(format_priority(&audio("something-else", None)), 0);
    }

    #[test]
    fn test_height_then_fps_ordering() {
        let p720 = video("avc1.64001f", Some("mp4a.40.2"), 720, Some(30));
        let p1080 = video("avc1.64001f", Some("mp4a.40.2"), 1080, Some(30));
        let p1080_60 = video("avc1.64001f", Some("mp4a.40.2"), 1080, Some(60));

        assert_eq!(compare_quality(&p720, &p1080), Ordering::Less);
        assert_eq!(compare_quality(&p1080, &p1080_60), Ordering::Less);
        assert_eq!(compare_quality(&p720, &p1080_60), Ordering::Less);
    }

    #[test]
    fn test_missing_fps_counts_as_thirty() {
        let explicit = video("vp9", None, 1080, Some(30));
        let implicit = video("vp9", None, 1080, None);
        assert_eq!(compare_quality(&explicit, &implicit), Ordering::Equal);
    }

    #[test]
    fn test_audio_bitrate_ordering() {
        let low = audio("opus", Some(128));
        let high = audio("opus", Some(160));

        assert_eq!(compare_quality(&low, &high), Ordering::Less);
        assert_eq!(compare_quality(&high, &low), Ordering::Greater);
        assert_eq!(compare_quality(&high, &high.clone()), Ordering::Equal);
    }

    #[test]
    fn test_missing_audio_bitrate_ranks_lowest() {
        let unknown = audio("opus", None);
        let known = audio("opus", Some(48));
        assert_eq!(compare_quality(&unknown, &known), Ordering::Less);
    }

    #[test]
    fn test_video_outranks_audio_within_label() {
        // Same label can only pair video/audio for codecs mapped by prefix;
        // an unknown codec name appearing as both exercises the branch.
        let vid = video("Custom", None, 480, None);
        let aud = audio("custom", Some(320));
        assert_eq!(friendly_label(&vid), friendly_label(&aud));
        assert_eq!(compare_quality(&vid, &aud), Ordering::Greater);
        assert_eq!(compare_quality(&aud, &vid), Ordering::Less);
    }

    #[test]
    fn test_cross_label_uses_priority() {
        // Opus (-3) outranks M4A (-4) regardless of bitrates.
        let opus = audio("opus", Some(64));
        let m4a = audio("mp4a.40.2", Some(320));
        assert_eq!(compare_quality(&m4a, &opus), Ordering::Less);
    }

    #[test]
    fn test_grouping_buckets_and_sorts() {
        let formats = vec![
            audio("opus", Some(128)),
            video("avc1.64001f", Some("mp4a.40.2"), 720, Some(30)),
            video("vp9", None, 1080, Some(60)),
            audio("opus", Some(160)),
            video("avc1.64001f", Some("mp4a.40.2"), 1080, Some(30)),
            video("vp9", None, 360, Some(30)),
        ];

        let groups = group_for_display(&formats);
        assert_eq!(groups.combined.len(), 2);
        assert_eq!(groups.video_only.len(), 2);
        assert_eq!(groups.audio_only.len(), 2);

        // best-first within each bucket
        assert_eq!(groups.combined[0].video_height, 1080);
        assert_eq!(groups.video_only[0].video_height, 1080);
        assert_eq!(groups.audio_only[0].audio_bitrate_kbps, Some(160));
    }

    // Strategy over the codec universe whose priorities are all distinct,
    // which is where the comparator is a genuine total order.
    fn arb_format() -> impl Strategy<Value = VideoFormat> {
        let videoish = (
            prop_oneof![Just("vp9"), Just("vp8"), Just("avc1.64001f")],
            prop_oneof![Just(144u32), Just(360), Just(720), Just(1080), Just(2160)],
            prop_oneof![Just(None), Just(Some(24u32)), Just(Some(30)), Just(Some(60))],
            proptest::bool::ANY,
        )
            .prop_map(|(codec, height, fps, with_audio)| {
                video(codec, with_audio.then_some("mp4a.40.2"), height, fps)
            });
        let audioish = (
            prop_oneof![Just("opus"), Just("vorbis"), Just("mp4a.40.2")],
            prop_oneof![Just(None), Just(Some(48u32)), Just(Some(128)), Just(Some(160))],
        )
            .prop_map(|(codec, abr)| audio(codec, abr));
        prop_oneof![videoish, audioish]
    }

    proptest! {
        #[test]
        fn prop_comparator_is_antisymmetric(a in arb_format(), b in arb_format()) {
            prop_assert_eq!(compare_quality(&a, &b), compare_quality(&b, &a).reverse());
        }

        #[test]
        fn prop_comparator_is_reflexive(a in arb_format()) {
            prop_assert_eq!(compare_quality(&a, &a), Ordering::Equal);
        }

        #[test]
        fn prop_comparator_is_transitive(
            a in arb_format(),
            b in arb_format(),
            c in arb_format(),
        ) {
            if compare_quality(&a, &b) != Ordering::Greater
                && compare_quality(&b, &c) != Ordering::Greater
            {
                prop_assert_ne!(compare_quality(&a, &c), Ordering::Greater);
            }
        }

        #[test]
        fn prop_sorting_is_idempotent(mut formats in proptest::collection::vec(arb_format(), 0..12)) {
            sort_best_first(&mut formats);
            let once: Vec<String> = formats.iter().map(|f| f.format_id.clone()).collect();
            sort_best_first(&mut formats);
            let twice: Vec<String> = formats.iter().map(|f| f.format_id.clone()).collect();
            prop_assert_eq!(once, twice);
        }
    }
}
