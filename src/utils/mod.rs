//! Utility functions and helpers.

pub mod http;

use std::sync::OnceLock;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Replace characters that are unsafe in filenames with underscores.
pub fn sanitize_filename(name: &str) -> String {
    static UNSAFE: OnceLock<regex::Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| regex::Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"));
    re.replace_all(name, "_").to_string()
}

/// Extract the final path segment of a URL as a filename.
///
/// Returns `None` for URLs whose path has no usable last segment.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }
    Some(sanitize_filename(segment))
}

/// Derive a human-readable title from a PDF filename.
///
/// Used when a link carries no label text.
pub fn title_from_filename(filename: &str) -> String {
    filename
        .trim_end_matches(".pdf")
        .trim_end_matches(".PDF")
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a byte count for log output.
pub fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    if bytes >= MB as u64 {
        format!("{:.1} MB", bytes as f64 / MB)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("http://example.com/results/").unwrap();
        assert_eq!(
            resolve_url(&base, "page.pdf"),
            "http://example.com/results/page.pdf"
        );
        assert_eq!(
            resolve_url(&base, "/root.pdf"),
            "http://example.com/root.pdf"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x.pdf"),
            "https://other.com/x.pdf"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b\\c:d.pdf"), "a_b_c_d.pdf");
        assert_eq!(sanitize_filename("plain.pdf"), "plain.pdf");
        assert_eq!(sanitize_filename("what?.pdf"), "what_.pdf");
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("http://example.com/ExamResults/BTECH_Sem1.pdf"),
            Some("BTECH_Sem1.pdf".to_string())
        );
        assert_eq!(filename_from_url("http://example.com/"), None);
        assert_eq!(filename_from_url("not a url"), None);
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("BTECH_Sem1.pdf"), "BTECH Sem1");
        assert_eq!(title_from_filename("mba-june-2025.PDF"), "mba june 2025");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "0.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
