//! Signature and quote stripping.
//!
//! Text signatures are found by scanning forward for the standalone `-- `
//! separator or a line starting with a known closing phrase, and truncating
//! at the earliest hit. HTML signatures are found by known class/id names,
//! plus the `<hr>` + short-trailing-block shape mailers love.
//!
//! Callers gate this on the message NOT being promotional — promotional
//! mail uses sign-offs as calls to action and must not be truncated. That
//! classification is an input here, never computed here.

use regex::Regex;
use std::sync::LazyLock;

use crate::content::transform::html_to_text;

/// Maximum text length of a block following an `<hr>` for the pair to be
/// treated as "signature divider + short sign-off".
const SIGNOFF_BLOCK_MAX_LEN: usize = 200;

/// Closing phrases that open a signature block, lower-case, several
/// languages. Matched with `starts_with` against the trimmed line.
const CLOSING_PHRASES: &[&str] = &[
    "regards",
    "best regards",
    "kind regards",
    "warm regards",
    "best wishes",
    "sincerely",
    "yours truly",
    "cheers,",
    "thanks,",
    "thank you,",
    "many thanks",
    "sent from my iphone",
    "sent from my ipad",
    "sent from my android",
    "get outlook for",
    "mit freundlichen grüßen",
    "viele grüße",
    "beste grüße",
    "cordialement",
    "bien cordialement",
    "saludos",
    "un saludo",
    "atentamente",
    "cumprimentos",
    "med vänliga hälsningar",
];

/// One signature container tag: the open-tag pattern carrying a known
/// signature class/id, plus the open/close patterns used by the depth scan.
/// The close is found by counting, not by regex — real signature blocks
/// nest children, and a non-greedy match would stop at the first close tag.
struct SigContainer {
    sig_open: Regex,
    any_open: Regex,
    close: Regex,
}

static SIG_CONTAINERS: LazyLock<Vec<SigContainer>> = LazyLock::new(|| {
    ["div", "p", "span", "table"]
        .iter()
        .map(|tag| SigContainer {
            sig_open: Regex::new(&format!(
                r#"(?i)<{tag}\b[^>]*(?:class|id)\s*=\s*["'][^"']*(?:gmail_signature|moz-signature|email[-_]?signature|signature|sig-?block)[^"']*["'][^>]*>"#
            ))
            .unwrap(),
            any_open: Regex::new(&format!(r"(?i)<{tag}\b[^>]*>")).unwrap(),
            close: Regex::new(&format!(r"(?i)</{tag}\s*>")).unwrap(),
        })
        .collect()
});

static HR_BLOCK_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["div", "p", "span", "table"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(
                r"(?is)<hr[^>]*>\s*<{tag}\b[^>]*>(?P<body>.*?)</{tag}>"
            ))
            .unwrap()
        })
        .collect()
});

/// Strip a trailing signature block from plain text.
///
/// Truncates at the earliest line that is either the standalone `-- `
/// separator or starts with a known closing phrase. If that would leave
/// nothing (the message IS the sign-off), the input is returned unchanged.
pub fn strip_signature_text(body: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();

        let is_separator = trimmed == "--";
        let is_closing = CLOSING_PHRASES.iter().any(|p| lower.starts_with(p));

        if is_separator || is_closing {
            break;
        }
        kept.push(line);
    }

    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }

    if kept.is_empty() {
        return body.to_string();
    }
    kept.join("\n")
}

/// Byte offset just past the close tag balancing an already-consumed open
/// tag, starting the scan at `pos`. Self-closing tags do not add depth;
/// unbalanced markup swallows to the end of input.
fn balanced_close(html: &str, mut pos: usize, container: &SigContainer) -> usize {
    let mut depth = 1usize;
    while depth > 0 {
        let Some(close) = container.close.find_at(html, pos) else {
            return html.len();
        };
        match container.any_open.find_at(html, pos) {
            Some(open) if open.start() < close.start() => {
                if !open.as_str().ends_with("/>") {
                    depth += 1;
                }
                pos = open.end();
            }
            _ => {
                depth -= 1;
                pos = close.end();
            }
        }
    }
    pos
}

/// Strip signature markup from HTML: known signature containers (removed to
/// their balanced close), and an `<hr>` followed immediately by a short
/// block.
pub fn strip_signature_html(html: &str) -> String {
    let mut out = html.to_string();

    for container in SIG_CONTAINERS.iter() {
        while let Some((start, body_from)) = container
            .sig_open
            .find(&out)
            .map(|m| (m.start(), m.end()))
        {
            let end = balanced_close(&out, body_from, container);
            out.replace_range(start..end, "");
        }
    }

    for re in HR_BLOCK_RES.iter() {
        out = re
            .replace_all(&out, |caps: &regex::Captures| {
                let body_text = html_to_text(&caps["body"]);
                if body_text.len() <= SIGNOFF_BLOCK_MAX_LEN {
                    String::new()
                } else {
                    caps[0].to_string()
                }
            })
            .to_string();
    }

    out
}

// Lines that open the quoted tail of a reply or forward. Everything from
// the first hit onward is dropped.
static QUOTE_TAIL_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^On .+ wrote:$",
        r"(?i)^-{2,}\s*original message\s*-{2,}$",
        r"(?i)^-{2,}\s*forwarded message\s*-{2,}$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Strip quoted reply text from a plain-text body: `>`-prefixed lines
/// anywhere, and everything from the first attribution or separator line
/// ([`QUOTE_TAIL_RES`]) onward.
pub fn strip_quoted_text(body: &str) -> String {
    let mut kept: Vec<&str> = body
        .lines()
        .take_while(|line| {
            let trimmed = line.trim();
            !QUOTE_TAIL_RES.iter().any(|re| re.is_match(trimmed))
        })
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect();

    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }

    kept.join("\n")
}
