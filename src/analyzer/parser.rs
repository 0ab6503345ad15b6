//! HTML analysis for fetched pages
//!
//! The document is parsed leniently by `scraper` (html5ever), so ordinary
//! malformed markup never fails. The element tree is then walked once with
//! an explicit stack: parent before children, siblings in document order.
//! Deeply nested documents cannot overflow the call stack.

use crate::state::AnalysisResult;
use scraper::{ElementRef, Html, Node};

/// Label used when the protocol suggests a modern page
pub const HTML5_LABEL: &str = "HTML5";

/// Label used for everything else
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Analyzes an HTML document
///
/// # Collected Metrics
///
/// - `h1`..`h6`: one count per heading element
/// - `a`: every `href` counts as a link. It is **external** if it starts with
///   `http` and does not start with the literal text of `base_url`, otherwise
///   **internal**. This is a plain text prefix check: no host resolution, so
///   relative links are always internal.
/// - `input`: any `type="password"` (case-insensitive) marks a login form
/// - `title`: the first non-empty trimmed title text wins
///
/// `html_version` is left empty for the caller to fill in.
///
/// # Example
///
/// ```
/// use sitelens::analyzer::analyze_document;
///
/// let html = r#"<title>Hi</title><h1>A</h1><a href="http://b.com">B</a>"#;
/// let result = analyze_document(html, "http://a.com");
/// assert_eq!(result.page_title, "Hi");
/// assert_eq!(result.headings.h1, 1);
/// assert_eq!(result.external_links, 1);
/// ```
pub fn analyze_document(html: &str, base_url: &str) -> AnalysisResult {
    let document = Html::parse_document(html);
    let mut result = AnalysisResult::default();

    let mut stack = vec![document.tree.root()];

    while let Some(node) = stack.pop() {
        if let Node::Element(element) = node.value() {
            let tag = element.name().to_ascii_lowercase();

            match tag.as_str() {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    if let Ok(level) = tag[1..].parse::<u8>() {
                        result.headings.increment(level);
                    }
                }
                "a" => {
                    for (_, href) in element.attrs().filter(|(name, _)| *name == "href") {
                        if is_external(href, base_url) {
                            result.external_links += 1;
                        } else {
                            result.internal_links += 1;
                        }
                    }
                }
                "input" => {
                    let is_password = element
                        .attrs()
                        .any(|(name, value)| name == "type" && value.eq_ignore_ascii_case("password"));
                    if is_password {
                        result.has_login_form = true;
                    }
                }
                "title" if result.page_title.is_empty() => {
                    if let Some(title) = ElementRef::wrap(node) {
                        let text = title.text().collect::<String>();
                        result.page_title = text.trim().to_string();
                    }
                }
                _ => {}
            }
        }

        // Reversed so the first child is popped next
        stack.extend(node.children().rev());
    }

    result
}

/// Lexical link classification
fn is_external(href: &str, base_url: &str) -> bool {
    href.starts_with("http") && !href.starts_with(base_url)
}

/// Derives the HTML version label from the HTTP protocol string
///
/// This is a placeholder, not DOCTYPE detection: anything mentioning `1.1`
/// is labelled HTML5, everything else Unknown.
pub fn detect_html_version(protocol: &str) -> &'static str {
    if protocol.contains("1.1") {
        HTML5_LABEL
    } else {
        UNKNOWN_LABEL
    }
}
