//! Progress line parsing for the tool's stdout

/// Literal marker the tool prefixes download-progress lines with
pub(crate) const PROGRESS_MARKER: &str = "[download]";

/// Parse one stdout line into a progress percentage.
///
/// A progress line starts with the marker at column 0 and carries a
/// percentage terminated by `%` later on the same line. Anything else is an
/// opaque status line and yields `None`, as do unparseable percentages;
/// malformed lines are never an error.
pub fn parse_progress_line(line: &str) -> Option<f64> {
    let rest = line.strip_prefix(PROGRESS_MARKER)?;
    let percent_pos = rest.find('%')?;
    rest[..percent_pos].trim().parse::<f64>().ok()
}
