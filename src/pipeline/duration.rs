use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap());

/// Render an ISO 8601 `PT#H#M#S` duration as a clock string.
///
/// `H:MM:SS` when an hour component is present, `M:SS` otherwise. Missing
/// components count as zero; anything that does not match yields `0:00`.
pub fn format_duration(code: &str) -> String {
    let Some(caps) = DURATION_RE.captures(code) else {
        return "0:00".to_string();
    };

    let component = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let (hours, minutes, seconds) = (component(1), component(2), component(3));

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
