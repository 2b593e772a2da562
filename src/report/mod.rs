//! Self-contained HTML dashboard with inline SVG charts.

pub mod html;
pub mod svg;

pub use html::{generate_html, write_html_report};

/// Escape a string for safe HTML insertion.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<Shree \"Ma.Vi\" & 'Co'>"),
            "&lt;Shree &quot;Ma.Vi&quot; &amp; &#x27;Co&#x27;&gt;"
        );
    }
}
