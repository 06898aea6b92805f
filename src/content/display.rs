//! Structure-preserving display processor.
//!
//! The standard transformer (transform.rs) normalizes aggressively; this
//! one is biased the other way — it keeps the source markup's layout for
//! rich display and only neutralizes known rendering hazards. Default
//! styling is applied exclusively to elements that carry no inline style:
//! an element with any `style` attribute at all is left completely
//! untouched, so authored styling is never silently overwritten.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::content::linkify::{breaks_to_paragraphs, escape_html, normalize_line_endings};
use crate::content::signature::{strip_signature_html, strip_signature_text};
use crate::message::model::CanonicalMessage;

/// Baseline typography annotation for unstyled wrapper containers.
const WRAPPER_STYLE: &str = "font-family:inherit;line-height:1.5";

/// Known quirk patch: table cells default to zero spacing.
const TD_STYLE: &str = "padding:0;border-spacing:0";

/// Known quirk patch: images render as block, never overflow.
const IMG_STYLE: &str = "display:block;max-width:100%";

/// Options for display processing.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    /// Strip a trailing signature block.
    pub strip_signature: bool,
    /// External classification: promotional messages use sign-offs as
    /// calls to action and must never be truncated. When true, signature
    /// stripping is skipped regardless of `strip_signature`.
    pub is_promotional: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            strip_signature: true,
            is_promotional: false,
        }
    }
}

/// Structural features detected in the source markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayFeatures {
    pub wrapper_containers: bool,
    pub data_tables: bool,
    pub embedded_images: bool,
    pub inline_styles: bool,
}

/// Result of display processing.
#[derive(Debug, Clone)]
pub struct DisplayOutput {
    /// Renderable HTML, wrapped in the responsive container.
    pub content: String,
    pub steps: Vec<String>,
    pub warnings: Vec<String>,
    pub features: DisplayFeatures,
}

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());
static IFRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe>").unwrap());
static OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<object\b[^>]*>.*?</object>").unwrap());
static EXEC_LEFTOVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(script|iframe|object|embed)\b[^>]*>").unwrap());
static EVENT_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\son\w+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).unwrap());

static WRAPPER_FEATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(div|table)\b[^>]*(width|max-width|align|center)").unwrap());
static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<table\b").unwrap());
static IMG_FEATURE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img\b").unwrap());
static STYLE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)\bstyle\s*="#).unwrap());

static DIV_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<div\b[^>]*>").unwrap());
static TD_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<td\b[^>]*>").unwrap());
static IMG_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*/?>").unwrap());

/// Structure-preserving processor for rich message display.
pub struct DisplayProcessor;

impl Default for DisplayProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Process a canonical message for rich display.
    ///
    /// Content extraction follows the same priority as standardization
    /// (HTML → text → resolved body); text-only messages are escaped and
    /// paragraph-wrapped instead of going through the markup pipeline.
    pub fn process(&self, message: &CanonicalMessage, options: &DisplayOptions) -> DisplayOutput {
        let mut steps = Vec::new();
        let warnings = Vec::new();

        if !message.body_html.trim().is_empty() {
            self.process_html(&message.body_html, options, steps, warnings)
        } else {
            let mut text = normalize_line_endings(&message.body_text);
            if text.trim().is_empty() {
                text = message.body.clone();
            }
            if options.strip_signature && !options.is_promotional {
                steps.push("strip-signature".to_string());
                text = strip_signature_text(&text);
            }
            steps.push("escape".to_string());
            steps.push("paragraphs".to_string());
            let fragment = breaks_to_paragraphs(&escape_html(&text));
            steps.push("wrap".to_string());

            DisplayOutput {
                content: wrap_responsive(&fragment),
                steps,
                warnings,
                features: DisplayFeatures::default(),
            }
        }
    }

    fn process_html(
        &self,
        html: &str,
        options: &DisplayOptions,
        mut steps: Vec<String>,
        warnings: Vec<String>,
    ) -> DisplayOutput {
        let mut content = normalize_line_endings(html);

        if options.strip_signature && !options.is_promotional {
            steps.push("strip-signature".to_string());
            content = strip_signature_html(&content);
        }

        steps.push("minimal-sanitize".to_string());
        content = minimal_sanitize(&content);

        let features = detect_features(&content);
        steps.push("detect-features".to_string());

        // Preserve structure: annotate, never replace.
        if features.wrapper_containers {
            steps.push("annotate-wrappers".to_string());
            content = add_default_style(&content, &DIV_OPEN_RE, WRAPPER_STYLE);
        }
        if features.data_tables {
            steps.push("patch-table-cells".to_string());
            content = add_default_style(&content, &TD_OPEN_RE, TD_STYLE);
        }
        if features.embedded_images {
            steps.push("patch-images".to_string());
            content = add_default_style(&content, &IMG_OPEN_RE, IMG_STYLE);
        }

        steps.push("wrap".to_string());
        DisplayOutput {
            content: wrap_responsive(&content),
            steps,
            warnings,
            features,
        }
    }
}

/// Detect structural features via pattern tests.
fn detect_features(html: &str) -> DisplayFeatures {
    DisplayFeatures {
        wrapper_containers: WRAPPER_FEATURE_RE.is_match(html),
        data_tables: TABLE_RE.is_match(html),
        embedded_images: IMG_FEATURE_RE.is_match(html),
        inline_styles: STYLE_ATTR_RE.is_match(html),
    }
}

/// Minimal sanitization: remove executable/embeddable elements and inline
/// event handlers, nothing else. Deliberately less aggressive than the
/// standard sanitizer — fidelity to the source layout matters here.
pub fn minimal_sanitize(html: &str) -> String {
    let pass = SCRIPT_RE.replace_all(html, "");
    let pass = IFRAME_RE.replace_all(&pass, "");
    let pass = OBJECT_RE.replace_all(&pass, "");
    let pass = EXEC_LEFTOVER_RE.replace_all(&pass, "");
    EVENT_ATTR_RE.replace_all(&pass, "").to_string()
}

/// Add a default `style` to every element the regex matches that carries
/// no style of its own. Styled elements are returned byte-for-byte.
fn add_default_style(html: &str, open_tag: &Regex, style: &str) -> String {
    open_tag
        .replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            if STYLE_ATTR_RE.is_match(tag) {
                return tag.to_string();
            }
            if let Some(head) = tag.strip_suffix("/>") {
                format!(r#"{} style="{style}"/>"#, head.trim_end())
            } else if let Some(head) = tag.strip_suffix('>') {
                format!(r#"{} style="{style}">"#, head.trim_end())
            } else {
                tag.to_string()
            }
        })
        .to_string()
}

/// Wrap content in a responsive container with a scoped stylesheet.
fn wrap_responsive(content: &str) -> String {
    format!(
        "<div class=\"mail-display\">\
         <style>\
         .mail-display{{max-width:100%;overflow-x:auto;line-height:1.5;word-wrap:break-word}}\
         .mail-display table{{border-collapse:collapse;max-width:100%}}\
         .mail-display img{{max-width:100%;height:auto}}\
         </style>{content}</div>"
    )
}
