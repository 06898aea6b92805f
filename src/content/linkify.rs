//! Text-to-HTML helpers: escaping, entity unescaping, URL/mailto
//! linkification, and line-break-to-paragraph conversion.
//!
//! Ordering matters everywhere here. Link conversion must happen before
//! generic escaping (escaping first would turn `&` inside a URL into
//! `&amp;` and corrupt the href), and escaping must not touch generated
//! anchor markup. Both constraints are satisfied the same way: matched
//! spans are swapped for opaque private-use-area markers before escaping
//! and expanded into anchors afterwards.

use regex::Regex;
use std::sync::LazyLock;

/// Marker delimiters from the Unicode private use area. `escape_html`
/// passes these through, so input that already carries them would be
/// misread during expansion — both render paths strip them up front.
const MARK_OPEN: char = '\u{e000}';
const MARK_CLOSE: char = '\u{e001}';

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        (?P<burl><(?P<burl_inner>https?://[^\s>]+)>)       # <https://...> bracketed
        | (?P<url>https?://[^\s<>"]+)                      # bare URL
        | (?P<email>[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})
    "#,
    )
    .unwrap()
});

static URL_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"]+"#).unwrap());

// ── Normalization ───────────────────────────────────────────────────

/// Normalize line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Normalize line endings and expand tabs.
pub fn normalize_text(text: &str) -> String {
    normalize_line_endings(text).replace('\t', "    ")
}

// ── Escaping ────────────────────────────────────────────────────────

/// HTML-escape `&`, `<`, `>`, `"`, `'`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Unescape the five standard named entities (plus the numeric apostrophe).
/// `&amp;` is handled last so `&amp;lt;` round-trips as `&lt;`.
pub fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

// ── Linkification ───────────────────────────────────────────────────

/// Trim trailing punctuation that prose attaches to a URL.
fn trim_url(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

/// Drop any pre-existing marker characters so [`expand_markers`] only ever
/// sees markers this module inserted itself.
fn strip_marker_chars(text: &str) -> String {
    text.replace([MARK_OPEN, MARK_CLOSE], "")
}

/// Render plain text (non-structured path) as an HTML fragment:
/// URLs and `<url>`-bracketed URLs become anchors, email addresses become
/// `mailto:` anchors, everything else is escaped. The anchor `href` keeps
/// the URL byte-for-byte — a literal `&` stays a literal `&`.
pub fn render_plain_fragment(text: &str, convert_urls: bool, convert_addresses: bool) -> String {
    let text = strip_marker_chars(text);
    let mut replacements: Vec<String> = Vec::new();
    let mut protected = String::with_capacity(text.len());
    let mut last = 0;

    for caps in LINK_RE.captures_iter(&text) {
        let whole = caps.get(0).unwrap();
        let replacement = if let Some(inner) = caps.name("burl_inner") {
            if !convert_urls {
                continue;
            }
            anchor(inner.as_str())
        } else if let Some(url) = caps.name("url") {
            if !convert_urls {
                continue;
            }
            let trimmed = trim_url(url.as_str());
            let mut a = anchor(trimmed);
            // Punctuation trimmed off the URL stays as escaped text.
            a.push_str(&escape_html(&url.as_str()[trimmed.len()..]));
            a
        } else if let Some(email) = caps.name("email") {
            if !convert_addresses {
                continue;
            }
            mailto(email.as_str())
        } else {
            continue;
        };

        protected.push_str(&text[last..whole.start()]);
        protected.push(MARK_OPEN);
        protected.push_str(&replacements.len().to_string());
        protected.push(MARK_CLOSE);
        replacements.push(replacement);
        last = whole.end();
    }
    protected.push_str(&text[last..]);

    expand_markers(&escape_html(&protected), &replacements)
}

/// Render structured data (XML/config payloads) as an HTML fragment:
/// protect URLs behind markers, escape the whole payload so the markup
/// displays literally, then restore the protected URLs as anchors.
pub fn render_structured_fragment(text: &str, convert_urls: bool) -> String {
    if !convert_urls {
        return escape_html(text);
    }

    let text = strip_marker_chars(text);
    let mut replacements: Vec<String> = Vec::new();
    let mut protected = String::with_capacity(text.len());
    let mut last = 0;

    for m in URL_ONLY_RE.find_iter(&text) {
        let url = trim_url(m.as_str());
        protected.push_str(&text[last..m.start()]);
        protected.push(MARK_OPEN);
        protected.push_str(&replacements.len().to_string());
        protected.push(MARK_CLOSE);
        let mut a = anchor(url);
        a.push_str(&escape_html(&m.as_str()[url.len()..]));
        replacements.push(a);
        last = m.end();
    }
    protected.push_str(&text[last..]);

    expand_markers(&escape_html(&protected), &replacements)
}

fn anchor(url: &str) -> String {
    format!(r#"<a href="{url}">{}</a>"#, escape_html(url))
}

fn mailto(addr: &str) -> String {
    format!(r#"<a href="mailto:{addr}">{}</a>"#, escape_html(addr))
}

fn expand_markers(escaped: &str, replacements: &[String]) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(start) = rest.find(MARK_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + MARK_OPEN.len_utf8()..];
        let Some(end) = after.find(MARK_CLOSE) else {
            out.push_str(&rest[start..]);
            return out;
        };
        if let Ok(idx) = after[..end].parse::<usize>()
            && let Some(rep) = replacements.get(idx)
        {
            out.push_str(rep);
        }
        rest = &after[end + MARK_CLOSE.len_utf8()..];
    }
    out.push_str(rest);
    out
}

// ── Paragraph conversion ────────────────────────────────────────────

/// Convert line breaks in an HTML fragment: double breaks become paragraph
/// boundaries, single breaks become `<br>`. Empty paragraphs are collapsed.
pub fn breaks_to_paragraphs(fragment: &str) -> String {
    static PARA_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

    let paras: Vec<String> = PARA_SPLIT
        .split(fragment)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
        .collect();
    paras.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Escaping ────────────────────────────────────────────────────

    #[test]
    fn escape_all_five() {
        assert_eq!(
            escape_html(r#"<a href="x" & 'y'>"#),
            "&lt;a href=&quot;x&quot; &amp; &#39;y&#39;&gt;"
        );
    }

    #[test]
    fn unescape_round_trip() {
        let original = r#"<b>"fish" & 'chips'</b>"#;
        assert_eq!(unescape_entities(&escape_html(original)), original);
    }

    #[test]
    fn normalize_crlf_and_tabs() {
        assert_eq!(normalize_text("a\r\nb\rc\td"), "a\nb\nc    d");
    }

    // ── Linkification order invariant ───────────────────────────────

    #[test]
    fn href_keeps_literal_ampersand() {
        let out = render_plain_fragment("visit http://a.example/?x=1&y=2", true, true);
        assert!(out.contains(r#"href="http://a.example/?x=1&y=2""#));
        // The visible anchor text is escaped.
        assert!(out.contains("x=1&amp;y=2</a>"));
    }

    #[test]
    fn surrounding_text_is_escaped() {
        let out = render_plain_fragment("a < b, see https://example.com", true, true);
        assert!(out.starts_with("a &lt; b"));
        assert!(out.contains(r#"<a href="https://example.com">"#));
    }

    #[test]
    fn bracketed_url_converted() {
        let out = render_plain_fragment("docs: <https://example.com/a?b=1&c=2>", true, true);
        assert!(out.contains(r#"href="https://example.com/a?b=1&c=2""#));
        // The angle brackets themselves are consumed, not escaped.
        assert!(!out.contains("&lt;https"));
    }

    #[test]
    fn email_becomes_mailto() {
        let out = render_plain_fragment("write to alice@example.com today", true, true);
        assert!(out.contains(r#"<a href="mailto:alice@example.com">alice@example.com</a>"#));
    }

    #[test]
    fn conversion_disabled_escapes_everything() {
        let out = render_plain_fragment("see https://example.com/x&y", false, false);
        assert_eq!(out, "see https://example.com/x&amp;y");
    }

    #[test]
    fn literal_marker_chars_in_input_are_inert() {
        let out =
            render_plain_fragment("\u{e000}0\u{e001} note, see https://example.com", true, true);
        // Exactly one anchor for the one URL; the stray marker sequence
        // must not be expanded into a duplicate.
        assert_eq!(out.matches("<a ").count(), 1);
        assert!(out.contains("note, see"));
        assert!(!out.contains('\u{e000}'));
        assert!(!out.contains('\u{e001}'));
    }

    #[test]
    fn trailing_punctuation_left_out_of_href() {
        let out = render_plain_fragment("go to https://example.com/page.", true, true);
        assert!(out.contains(r#"href="https://example.com/page""#));
        assert!(out.ends_with("</a>."));
    }

    // ── Structured path ─────────────────────────────────────────────

    #[test]
    fn structured_markup_escaped_urls_restored() {
        let input = r#"<endpoint url="https://api.example.com/v1?a=1&b=2"/>"#;
        let out = render_structured_fragment(input, true);
        // The XML displays literally...
        assert!(out.starts_with("&lt;endpoint"));
        // ...but the URL inside survives as a working anchor.
        assert!(out.contains(r#"href="https://api.example.com/v1?a=1&b=2""#));
    }

    #[test]
    fn structured_marker_chars_in_input_are_inert() {
        let out = render_structured_fragment(
            "\u{e000}9\u{e001}<url>https://example.com/a</url>",
            true,
        );
        assert_eq!(out.matches("<a ").count(), 1);
        assert!(out.contains(r#"href="https://example.com/a""#));
    }

    #[test]
    fn structured_without_urls_is_plain_escape() {
        let out = render_structured_fragment("<config><x>1</x></config>", true);
        assert_eq!(out, "&lt;config&gt;&lt;x&gt;1&lt;/x&gt;&lt;/config&gt;");
    }

    // ── Paragraph conversion ────────────────────────────────────────

    #[test]
    fn double_break_becomes_paragraph() {
        assert_eq!(
            breaks_to_paragraphs("first\n\nsecond"),
            "<p>first</p>\n<p>second</p>"
        );
    }

    #[test]
    fn single_break_becomes_br() {
        assert_eq!(breaks_to_paragraphs("one\ntwo"), "<p>one<br>two</p>");
    }

    #[test]
    fn empty_paragraphs_collapsed() {
        assert_eq!(
            breaks_to_paragraphs("a\n\n\n\n   \n\nb"),
            "<p>a</p>\n<p>b</p>"
        );
    }
}
