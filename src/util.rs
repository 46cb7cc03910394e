use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use std::time::Duration;

pub(crate) fn retriable_status(code: u16) -> bool {
    matches!(code, 500 | 502 | 503 | 504 | 429 | 408)
}

pub(crate) fn backoff(current: Duration, max: Duration) -> Duration {
    let next = Duration::from_secs_f64((current.as_secs_f64() * 1.5).max(1.0));
    if next > max { max } else { next }
}

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

pub(crate) fn append_query(url: &str, params: &[(&str, &str)]) -> String {
    let mut out = url.to_string();
    let sep = if url.contains('?') { '&' } else { '?' };
    out.push(sep);
    let mut first = true;
    for (k, v) in params {
        if !first {
            out.push('&');
        }
        first = false;
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }
    out
}

pub(crate) fn slug(s: &str) -> String {
    s.trim().trim_matches('/').to_string()
}

/// Appends `segments` to the path of `base`, percent-encoding each one so a
/// slug never spills into another segment, the query or the fragment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<String> {
    let mut url = Url::parse(base).with_context(|| format!("invalid API URL {}", base))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("invalid API URL {} (cannot be a base)", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let max = Duration::from_secs(5);
        let first = backoff(Duration::from_millis(100), max);
        assert_eq!(first, Duration::from_secs(1));
        let second = backoff(first, max);
        assert_eq!(second, Duration::from_secs_f64(1.5));
        assert_eq!(backoff(Duration::from_secs(4), max), max);
    }

    #[test]
    fn urljoin_handles_slashes_and_absolute_links() {
        assert_eq!(urljoin("https://a.test/", "/ws"), "https://a.test/ws");
        assert_eq!(urljoin("https://a.test", "ws/p"), "https://a.test/ws/p");
        assert_eq!(
            urljoin("https://a.test", "https://cdn.test/x.zip"),
            "https://cdn.test/x.zip"
        );
    }

    #[test]
    fn append_query_picks_separator() {
        assert_eq!(append_query("http://h/p", &[("a", "1")]), "http://h/p?a=1");
        assert_eq!(
            append_query("http://h/p?a=1", &[("b", "2"), ("c", "3")]),
            "http://h/p?a=1&b=2&c=3"
        );
    }

    #[test]
    fn slug_drops_padding() {
        assert_eq!(slug(" maya-glyphs/ "), "maya-glyphs");
        assert_eq!(slug("/ws/proj/"), "ws/proj");
    }

    #[test]
    fn endpoint_encodes_each_segment() {
        assert_eq!(
            endpoint("http://h/api/", &["a b", "x?y#z", "c/d"]).unwrap(),
            "http://h/api/a%20b/x%3Fy%23z/c%2Fd"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:8080", &["maya-glyphs", "yax-w4l6k", "1"]).unwrap(),
            "http://127.0.0.1:8080/maya-glyphs/yax-w4l6k/1"
        );
    }

    #[test]
    fn endpoint_rejects_unusable_base() {
        assert!(endpoint("not a url", &["ws"]).is_err());
        assert!(endpoint("mailto:someone@example.com", &["ws"]).is_err());
    }

    #[test]
    fn retriable_statuses() {
        assert!(retriable_status(503));
        assert!(retriable_status(429));
        assert!(!retriable_status(404));
        assert!(!retriable_status(202));
    }
}
