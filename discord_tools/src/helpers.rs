use std::time::Duration;

use reqwest::header::HeaderMap;

pub const COLOR_GREEN: u32 = 0x57F287;
pub const COLOR_YELLOW: u32 = 0xFEE75C;
pub const COLOR_RED: u32 = 0xED4245;

/// Discord rejects embed field values longer than this.
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// Joins the lines with newlines, keeping the result within `limit` characters. Lines that do not fit are replaced by
/// an "…and N more" line.
pub fn truncate_list(lines: &[String], limit: usize) -> String {
    let full = lines.join("\n");
    if full.chars().count() <= limit {
        return full;
    }
    let suffix = |hidden: usize| format!("…and {hidden} more");
    let mut kept = 0;
    let mut len = 0;
    for line in lines {
        let sep = usize::from(kept > 0);
        let hidden = lines.len() - kept - 1;
        let needed = len + sep + line.chars().count() + 1 + suffix(hidden).chars().count();
        if needed > limit {
            break;
        }
        len += sep + line.chars().count();
        kept += 1;
    }
    let mut result = lines[..kept].join("\n");
    if kept > 0 {
        result.push('\n');
    }
    result.push_str(&suffix(lines.len() - kept));
    result
}

/// How long Discord wants us to wait. The `Retry-After` header wins over the `retry_after` body field. Anything
/// unparseable falls back to `default`, and the result never exceeds `max`.
pub(crate) fn retry_delay(
    headers: &HeaderMap,
    body_retry_after: Option<f64>,
    default: Duration,
    max: Duration,
) -> Duration {
    let from_header = headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok());
    let delay = from_header
        .or(body_retry_after)
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(default);
    delay.min(max)
}

#[cfg(test)]
mod test {
    use reqwest::header::{HeaderValue, RETRY_AFTER};

    use super::*;

    fn lines(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("• LP-240517-{i:04} · Customer {i} · Magic · 3d 2h")).collect()
    }

    #[test]
    fn short_lists_are_untouched() {
        let l = lines(3);
        assert_eq!(truncate_list(&l, FIELD_VALUE_LIMIT), l.join("\n"));
        assert_eq!(truncate_list(&[], FIELD_VALUE_LIMIT), "");
    }

    #[test]
    fn long_lists_are_cut_with_a_count() {
        let l = lines(100);
        let s = truncate_list(&l, FIELD_VALUE_LIMIT);
        assert!(s.chars().count() <= FIELD_VALUE_LIMIT);
        let shown = s.lines().filter(|line| line.starts_with('•')).count();
        assert!(shown > 0);
        assert!(s.ends_with(&format!("…and {} more", 100 - shown)));
    }

    #[test]
    fn a_single_huge_line_is_summarised() {
        let l = vec!["x".repeat(2000), "y".to_string()];
        assert_eq!(truncate_list(&l, 50), "…and 2 more");
    }

    #[test]
    fn retry_after_precedence() {
        let default = Duration::from_secs(2);
        let max = Duration::from_secs(60);
        let mut headers = HeaderMap::new();
        assert_eq!(retry_delay(&headers, None, default, max), default);
        assert_eq!(retry_delay(&headers, Some(1.5), default, max), Duration::from_millis(1500));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_delay(&headers, Some(1.5), default, max), Duration::from_secs(3));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3600"));
        assert_eq!(retry_delay(&headers, None, default, max), max);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_delay(&headers, None, default, max), default);
    }
}
