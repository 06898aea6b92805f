//! Content transformer — turns raw message content into safe renderable
//! HTML plus a plain-text derivative.
//!
//! Branches on the classifier verdict (or a source-provided hint):
//! - HTML: normalize line endings, run the injected sanitizer, derive a
//!   plain-text mirror by tag stripping.
//! - Text: normalize, then either the structured-data path (protect URLs,
//!   escape the payload, restore anchors) or the prose path (linkify, then
//!   escape the remainder).
//!
//! Never returns an error: sub-step failures downgrade to a fallback value
//! and a recorded warning.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::capability::{HtmlSanitizer, SanitizeMode};
use crate::classify::ContentClassifier;
use crate::content::linkify::{
    breaks_to_paragraphs, normalize_line_endings, normalize_text, render_plain_fragment,
    render_structured_fragment, unescape_entities,
};

/// Content type resolved for a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Text,
}

impl ContentType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
        }
    }
}

/// Transformation options.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Convert bare and `<bracketed>` URLs to anchors.
    pub convert_urls: bool,
    /// Convert email addresses to `mailto:` anchors.
    pub convert_addresses: bool,
    /// Convert double/single line breaks to paragraphs/`<br>`.
    pub preserve_line_breaks: bool,
    /// Mode handed to the injected sanitizer on the HTML branch.
    pub sanitize_mode: SanitizeMode,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            convert_urls: true,
            convert_addresses: true,
            preserve_line_breaks: true,
            sanitize_mode: SanitizeMode::Email,
        }
    }
}

/// Result of a transformation. Both renderings are always present so
/// downstream consumers never special-case content type.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Safe renderable HTML.
    pub html: String,
    /// Plain-text derivative (search, previews).
    pub plain_text: String,
    /// Which branch produced the output.
    pub content_type: ContentType,
    /// Ordered record of the steps that ran.
    pub steps: Vec<String>,
    /// Soft failures encountered along the way.
    pub warnings: Vec<String>,
}

static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(p|div|table|tr|td|ul|ol|li|h[1-6]|blockquote|br)[\s>/]").unwrap()
});
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").unwrap());

/// Derive a plain-text mirror from HTML: drop script/style blocks, strip
/// tags, unescape the standard entities, collapse whitespace.
pub fn html_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, " ");
    let without_styles = STYLE_RE.replace_all(&without_scripts, " ");

    let mut stripped = String::with_capacity(without_styles.len());
    let mut in_tag = false;
    for ch in without_styles.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                // Tag boundaries separate words ("<p>a</p><p>b</p>").
                stripped.push(' ');
            }
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }

    unescape_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classify-then-branch content transformer.
pub struct ContentTransformer {
    classifier: ContentClassifier,
}

impl Default for ContentTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTransformer {
    pub fn new() -> Self {
        Self {
            classifier: ContentClassifier::new(),
        }
    }

    /// Transform raw content, deciding the branch via the classifier.
    pub fn transform(
        &self,
        raw: &str,
        sanitizer: Option<&dyn HtmlSanitizer>,
        options: &TransformOptions,
    ) -> TransformOutput {
        self.transform_with_hint(raw, None, sanitizer, options)
    }

    /// Transform raw content with an optional source-provided content-type
    /// hint. Standardized messages that carried an explicit HTML field skip
    /// classification; generic bodies fall back to the classifier.
    pub fn transform_with_hint(
        &self,
        raw: &str,
        hint: Option<ContentType>,
        sanitizer: Option<&dyn HtmlSanitizer>,
        options: &TransformOptions,
    ) -> TransformOutput {
        if raw.trim().is_empty() {
            return TransformOutput {
                html: String::new(),
                plain_text: String::new(),
                content_type: ContentType::Text,
                steps: vec!["empty-input".to_string()],
                warnings: Vec::new(),
            };
        }

        let mut steps = Vec::new();
        let content_type = match hint {
            Some(ct) => ct,
            None => {
                steps.push("classify".to_string());
                if self.classifier.classify(raw).is_html {
                    ContentType::Html
                } else {
                    ContentType::Text
                }
            }
        };

        match content_type {
            ContentType::Html => self.transform_html(raw, sanitizer, options, steps),
            ContentType::Text => self.transform_text(raw, options, steps),
        }
    }

    fn transform_html(
        &self,
        raw: &str,
        sanitizer: Option<&dyn HtmlSanitizer>,
        options: &TransformOptions,
        mut steps: Vec<String>,
    ) -> TransformOutput {
        let mut warnings = Vec::new();

        steps.push("normalize-line-endings".to_string());
        let normalized = normalize_line_endings(raw);

        let mut html = match sanitizer {
            Some(s) => match s.sanitize(&normalized, options.sanitize_mode) {
                Ok(clean) => {
                    steps.push(format!("sanitize:{}", options.sanitize_mode.label()));
                    clean
                }
                Err(e) => {
                    warn!(error = %e, "HTML sanitizer failed, rendering unsanitized");
                    warnings.push(format!("sanitizer failed: {e}"));
                    normalized
                }
            },
            None => {
                warn!("HTML sanitizer unavailable, rendering unsanitized");
                warnings.push("sanitizer unavailable, rendering unsanitized HTML".to_string());
                normalized
            }
        };

        // Inline-only markup with literal newlines still benefits from
        // paragraph conversion; structured HTML is left alone.
        if options.preserve_line_breaks && !BLOCK_TAG_RE.is_match(&html) && html.contains('\n') {
            steps.push("paragraphs".to_string());
            html = breaks_to_paragraphs(&html);
        }

        steps.push("derive-plain-text".to_string());
        let plain_text = html_to_text(&html);

        TransformOutput {
            html,
            plain_text,
            content_type: ContentType::Html,
            steps,
            warnings,
        }
    }

    fn transform_text(
        &self,
        raw: &str,
        options: &TransformOptions,
        mut steps: Vec<String>,
    ) -> TransformOutput {
        steps.push("normalize-text".to_string());
        let normalized = normalize_text(raw);

        let fragment = if self.classifier.is_structured_data(&normalized) {
            // Escaping first would mangle URLs containing `&`, so the URLs
            // are protected behind placeholders across the escape.
            steps.push("protect-urls".to_string());
            steps.push("escape".to_string());
            render_structured_fragment(&normalized, options.convert_urls)
        } else {
            if options.convert_urls {
                steps.push("linkify-urls".to_string());
            }
            if options.convert_addresses {
                steps.push("linkify-addresses".to_string());
            }
            steps.push("escape".to_string());
            render_plain_fragment(&normalized, options.convert_urls, options.convert_addresses)
        };

        let html = if options.preserve_line_breaks && fragment.contains('\n') {
            steps.push("paragraphs".to_string());
            breaks_to_paragraphs(&fragment)
        } else {
            fragment
        };

        TransformOutput {
            html,
            plain_text: normalized,
            content_type: ContentType::Text,
            steps,
            warnings: Vec::new(),
        }
    }
}
