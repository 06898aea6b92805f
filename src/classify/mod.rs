//! Content-type classifier — HTML vs plain text vs structured data.
//!
//! Accumulates a signed score from weighted regex signals and converts it
//! to a confidence verdict. The asymmetry is deliberate: ordinary prose
//! mentioning `<3` or `a < b` must never flip to HTML, and a single real
//! tag pair must not outweigh several structured-data signals. Negative
//! signals are capped at 2 matches per pattern and positive signals at 3,
//! so repetitive machine-generated input cannot run the score away.

use regex::Regex;

/// Score divisor for confidence normalization.
const CONFIDENCE_SCALE: f32 = 25.0;

/// Confidence threshold above which content is considered HTML.
const HTML_THRESHOLD: f32 = 0.4;

/// Max counted matches per negative (structured-data) pattern.
const NEGATIVE_CAP: usize = 2;

/// Max counted matches per positive (HTML) pattern.
const POSITIVE_CAP: usize = 3;

/// Result of classifying a piece of content.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Final verdict: `confidence > 0.4` and raw score positive.
    pub is_html: bool,
    /// Normalized score in `0.0..=1.0`.
    pub confidence: f32,
    /// Labels of every signal that matched, for diagnostics.
    pub indicators: Vec<String>,
    /// Raw signed score before normalization.
    pub score: i32,
}

impl Classification {
    fn plain() -> Self {
        Self {
            is_html: false,
            confidence: 0.0,
            indicators: Vec::new(),
            score: 0,
        }
    }
}

/// A single weighted signal with a compiled regex.
struct Signal {
    regex: Regex,
    weight: i32,
    cap: usize,
    label: &'static str,
}

/// Weighted-signal content classifier.
///
/// Patterns are compiled once at construction; [`classify`](Self::classify)
/// is a pure function of its input.
pub struct ContentClassifier {
    negative: Vec<Signal>,
    positive: Vec<Signal>,
    url_attr: Regex,
    doc_open: Regex,
    doc_close: Regex,
    lone_tag: Regex,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentClassifier {
    /// Build a classifier with the built-in signal tables.
    pub fn new() -> Self {
        let signal = |pattern: &str, weight: i32, cap: usize, label: &'static str| Signal {
            regex: Regex::new(pattern).unwrap(),
            weight,
            cap,
            label,
        };

        let negative = vec![
            // XML declaration — the strongest structured-data marker.
            signal(r"(?i)^\s*<\?xml", -8, NEGATIVE_CAP, "xml-declaration"),
            // Root elements of known config/data vocabularies.
            signal(
                r"(?i)<(config|configuration|settings|properties|data|root|document|item|entry|record|response|request|payload|manifest|feed|rss|svg)[\s>]",
                -5,
                NEGATIVE_CAP,
                "data-root-element",
            ),
            // ALL-CAPS tag names read as machine vocabulary, not HTML.
            signal(r"<[A-Z][A-Z0-9_]+[\s>/]", -4, NEGATIVE_CAP, "uppercase-tag"),
            // Namespaced tags (soap:Envelope, xsl:template, ...).
            signal(r"<\w+:\w+", -5, NEGATIVE_CAP, "namespaced-tag"),
            // Whole input is one minimal open/close pair around text.
            signal(
                r"^\s*<(\w+)[^>]*>[^<]*</(\w+)>\s*$",
                -3,
                NEGATIVE_CAP,
                "single-pair-xml",
            ),
        ];

        let positive = vec![
            signal(
                r"(?i)</(div|p|table|tr|td|th|ul|ol|li|h[1-6]|blockquote|section|article|header|footer)>",
                4,
                POSITIVE_CAP,
                "closing-block-tag",
            ),
            signal(
                r"(?i)<(div|p|table|tr|td|th|ul|ol|li|h[1-6]|blockquote|br|hr)[\s>/]",
                3,
                POSITIVE_CAP,
                "block-tag",
            ),
            signal(
                r"(?i)<(a|b|i|u|em|strong|span|img|font|small|sup|sub)[\s>/]",
                2,
                POSITIVE_CAP,
                "inline-tag",
            ),
            signal(
                r"(?i)</(a|b|i|u|em|strong|span|font|small|sup|sub)>",
                2,
                POSITIVE_CAP,
                "closing-inline-tag",
            ),
            // Entities and classed elements weigh least.
            signal(
                r"&(nbsp|amp|lt|gt|quot|apos|copy|reg|mdash|ndash|hellip);",
                1,
                POSITIVE_CAP,
                "named-entity",
            ),
            signal(r#"(?i)style\s*=\s*["']"#, 2, POSITIVE_CAP, "style-attribute"),
            signal(r#"(?i)class\s*=\s*["']"#, 1, POSITIVE_CAP, "class-attribute"),
            // Document-structure tags and DOCTYPE weigh most.
            signal(
                r"(?i)<(html|head|body|title|meta|link)[\s>/]",
                6,
                POSITIVE_CAP,
                "document-tag",
            ),
            signal(r"(?i)<!doctype\s+html", 8, POSITIVE_CAP, "doctype"),
        ];

        Self {
            negative,
            positive,
            url_attr: Regex::new(r#"(?i)(href|src)\s*=\s*["']"#).unwrap(),
            doc_open: Regex::new(r"(?i)<(html|body)[\s>]").unwrap(),
            doc_close: Regex::new(r"(?i)</(html|body)>").unwrap(),
            lone_tag: Regex::new(r"<\w+>").unwrap(),
        }
    }

    /// Classify content as HTML or plain text.
    ///
    /// Pure and total: identical input yields an identical result, and
    /// degenerate input (empty or whitespace-only) returns a deterministic
    /// non-HTML verdict rather than erroring.
    pub fn classify(&self, text: &str) -> Classification {
        if text.trim().is_empty() {
            return Classification::plain();
        }

        let mut score = 0i32;
        let mut indicators = Vec::new();

        for sig in self.negative.iter().chain(self.positive.iter()) {
            let matches = sig.regex.find_iter(text).take(sig.cap).count();
            if matches > 0 {
                score += sig.weight * matches as i32;
                indicators.push(sig.label.to_string());
            }
        }

        // Plain-text signals.
        if !text.contains('<') {
            score -= 2;
            indicators.push("no-markup".to_string());
        } else if self.lone_tag.find_iter(text).count() == 1 && !text.contains("</") {
            // A single bracketed token with no closing structure, e.g.
            // "press <Enter> to continue".
            score -= 2;
            indicators.push("isolated-tag".to_string());
        }

        // Context bonuses.
        if self.doc_open.is_match(text) && self.doc_close.is_match(text) {
            score += 5;
            indicators.push("document-wrapper".to_string());
        }
        if self.url_attr.is_match(text) {
            score += 3;
            indicators.push("link-attribute".to_string());
        }
        let confidence = (score as f32 / CONFIDENCE_SCALE).clamp(0.0, 1.0);

        Classification {
            is_html: confidence > HTML_THRESHOLD && score > 0,
            confidence,
            indicators,
            score,
        }
    }

    /// Whether the text looks like machine-generated XML/config rather than
    /// authored content. Reuses the negative signal table as a boolean —
    /// the transformer's structured-data branch keys off this.
    pub fn is_structured_data(&self, text: &str) -> bool {
        self.negative.iter().any(|sig| sig.regex.is_match(text))
    }
}
