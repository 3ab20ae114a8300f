//! Plain-text extraction for uploaded files and fetched pages.
//!
//! Every extractor returns whitespace-collapsed text; that is the only
//! contract the chunker relies on.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::errors::ApiError;

/// Kind of document, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Html,
    Text,
}

impl DocumentFormat {
    pub fn from_filename(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => DocumentFormat::Pdf,
            Some("html") | Some("htm") => DocumentFormat::Html,
            _ => DocumentFormat::Text,
        }
    }
}

/// Collapses every whitespace run into a single space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re.replace_all(text, " ").trim().to_string()
}

/// Strips markup, dropping script, style and noscript bodies entirely.
pub fn html_to_text(html: &str) -> String {
    static HIDDEN: OnceLock<Regex> = OnceLock::new();
    static COMMENTS: OnceLock<Regex> = OnceLock::new();
    static TAGS: OnceLock<Regex> = OnceLock::new();

    let hidden = HIDDEN.get_or_init(|| {
        Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)\s*>")
            .expect("static regex")
    });
    let comments = COMMENTS.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));
    let tags = TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));

    let without_hidden = hidden.replace_all(html, " ");
    let without_comments = comments.replace_all(&without_hidden, " ");
    let without_tags = tags.replace_all(&without_comments, " ");
    normalize_whitespace(&html_escape::decode_html_entities(&without_tags))
}

/// Extracts PDF text. CPU-bound; call from `spawn_blocking`.
pub fn pdf_to_text(bytes: &[u8]) -> Result<String, ApiError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ApiError::BadRequest(format!("PDF extraction failed: {}", e)))?;
    Ok(normalize_whitespace(&text))
}

/// Extracts normalized text from a file's raw bytes.
pub async fn extract_document(filename: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
    match DocumentFormat::from_filename(filename) {
        DocumentFormat::Pdf => tokio::task::spawn_blocking(move || pdf_to_text(&bytes))
            .await
            // pdf parsing can panic on malformed input; treat it as a bad file
            .map_err(|e| ApiError::BadRequest(format!("PDF extraction failed: {}", e)))?,
        DocumentFormat::Html => Ok(html_to_text(&String::from_utf8_lossy(&bytes))),
        DocumentFormat::Text => Ok(normalize_whitespace(&String::from_utf8_lossy(&bytes))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_runs_collapse_to_single_spaces() {
        assert_eq!(
            normalize_whitespace("  Hello,\n\n\tworld  \r\n again "),
            "Hello, world again"
        );
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn html_stripping_drops_markup_and_scripts() {
        let html = r#"
            <html>
            <head><script>var x = 1;</script><style>p { color: red; }</style></head>
            <body>
                <!-- hidden note -->
                <h1>Hello</h1>
                <p>World &amp; friends &lt;3</p>
            </body>
            </html>
        "#;

        let text = html_to_text(html);

        assert_eq!(text, "Hello World & friends <3");
    }

    #[test]
    fn numeric_and_named_entities_are_decoded() {
        let text = html_to_text("<p>It&#8217;s &#x2F; caf&eacute;&nbsp;&copy;</p>");
        assert_eq!(text, "It\u{2019}s / caf\u{e9} \u{a9}");
    }

    #[test]
    fn format_is_picked_by_extension() {
        assert_eq!(DocumentFormat::from_filename("Manual.PDF"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_filename("page.htm"), DocumentFormat::Html);
        assert_eq!(DocumentFormat::from_filename("notes.md"), DocumentFormat::Text);
        assert_eq!(DocumentFormat::from_filename("README"), DocumentFormat::Text);
    }

    #[tokio::test]
    async fn text_documents_are_normalized() {
        let text = extract_document("notes.txt", b"line one\n\nline   two\n".to_vec())
            .await
            .expect("text extraction");
        assert_eq!(text, "line one line two");
    }

    #[tokio::test]
    async fn invalid_pdf_is_a_bad_request() {
        let result = extract_document("broken.pdf", b"not a pdf".to_vec()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
