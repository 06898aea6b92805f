//! Message standardizer — maps raw source records into the canonical model.
//!
//! One mapping function per source variant, sharing defensive helpers.
//! Every field gets a default: standardization is total and never fails,
//! no matter how degenerate the input record is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::content::transform::html_to_text;
use crate::message::address::{parse_address, parse_address_list};
use crate::message::model::{Address, AttachmentRef, CanonicalMessage, MessageSource};

// ── Source record shapes ────────────────────────────────────────────

/// Attachment as sources ship it — field names differ per source, so the
/// common spellings are accepted as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAttachment {
    #[serde(alias = "name", alias = "fileName")]
    pub filename: Option<String>,
    #[serde(alias = "mimeType", alias = "contentType", alias = "mime_type")]
    pub content_type: Option<String>,
    pub size: Option<u64>,
    #[serde(alias = "data")]
    pub content: Option<String>,
    #[serde(alias = "attachmentId")]
    pub attachment_id: Option<String>,
    #[serde(alias = "messageId")]
    pub message_id: Option<String>,
    #[serde(alias = "isInline", alias = "inline")]
    pub is_inline: bool,
    #[serde(alias = "contentId", alias = "cid")]
    pub content_id: Option<String>,
}

/// Lightweight record from the cloud mail API. Address-shaped fields stay
/// as raw JSON — the API is not consistent about their shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudApiRecord {
    pub id: Option<String>,
    pub message_id: Option<String>,
    pub thread_id: Option<String>,
    pub from: Value,
    pub to: Value,
    pub cc: Value,
    pub bcc: Value,
    pub subject: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
    /// Generic body, tagged by `body_is_html`.
    pub body: Option<String>,
    pub body_is_html: Option<bool>,
    pub snippet: Option<String>,
    /// String date or epoch number; anything else falls back to now.
    pub date: Value,
    pub read: Option<bool>,
    pub attachments: Vec<RawAttachment>,
}

/// Record fetched over the direct mailbox protocol.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MailboxRecord {
    pub uid: Option<u64>,
    pub message_id: Option<String>,
    pub subject: Option<String>,
    pub from: Value,
    pub to: Value,
    pub cc: Value,
    pub date: Value,
    /// Protocol flags; `\Seen` marks the message read.
    pub flags: Vec<String>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
    pub attachments: Vec<RawAttachment>,
}

/// Structured output of the raw-message (RFC-822) parse capability.
/// Addresses are already typed here — the parser resolves them.
#[derive(Debug, Clone, Default)]
pub struct ParsedRfc822Record {
    pub message_id: Option<String>,
    pub thread_id: Option<String>,
    pub from: Option<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub subject: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
    pub attachments: Vec<RawAttachment>,
}

/// Closed set of source record variants. One mapping function per variant
/// feeds the single canonical output type.
#[derive(Debug, Clone)]
pub enum SourceRecord {
    CloudApi(CloudApiRecord),
    Mailbox(MailboxRecord),
    Rfc822(ParsedRfc822Record),
}

// ── Standardization ─────────────────────────────────────────────────

/// Map a raw source record into a canonical message.
///
/// Total: for any input (including all-empty records) the result has
/// non-empty `id`, `message_id`, and `body`, a valid date/timestamp pair,
/// and `has_attachments` consistent with the attachment list.
pub fn standardize(record: SourceRecord, placeholder: &str) -> CanonicalMessage {
    let now = Utc::now();
    let mut msg = match record {
        SourceRecord::CloudApi(r) => map_cloud_api(r, now),
        SourceRecord::Mailbox(r) => map_mailbox(r, now),
        SourceRecord::Rfc822(r) => map_rfc822(r, now),
    };

    resolve_identity(&mut msg, now);

    // A text mirror is synthesized from HTML so search and previews
    // always have something to index.
    if msg.body_text.trim().is_empty() && !msg.body_html.trim().is_empty() {
        msg.body_text = html_to_text(&msg.body_html);
    }

    // Ownership invariant: an attachment_id never travels without the
    // owning message's id.
    for att in &mut msg.attachments {
        if att.attachment_id.is_some() && att.message_id.is_none() {
            att.message_id = Some(msg.message_id.clone());
        }
    }

    msg.resync(placeholder);
    msg
}

fn map_cloud_api(r: CloudApiRecord, now: DateTime<Utc>) -> CanonicalMessage {
    let (body_html, body_text) = resolve_bodies(
        r.html.as_deref(),
        r.text.as_deref(),
        r.body.as_deref(),
        r.body_is_html,
        r.snippet.as_deref(),
    );
    let (date, timestamp) = parse_date_value(&r.date, now);
    let message_id = r.message_id.or_else(|| r.id.clone());

    base_message(
        r.id,
        message_id,
        r.thread_id,
        parse_address(&r.from),
        parse_address_list(&r.to),
        parse_address_list(&r.cc),
        parse_address_list(&r.bcc),
        r.subject,
        body_html,
        body_text,
        date,
        timestamp,
        r.attachments,
        r.read.unwrap_or(false),
        MessageSource::CloudApi,
    )
}

fn map_mailbox(r: MailboxRecord, now: DateTime<Utc>) -> CanonicalMessage {
    let (date, timestamp) = parse_date_value(&r.date, now);
    let read = r.flags.iter().any(|f| f.eq_ignore_ascii_case("\\Seen"));
    let id = r.uid.map(|u| u.to_string());
    let message_id = r.message_id.or_else(|| id.clone());

    base_message(
        id,
        message_id,
        None,
        parse_address(&r.from),
        parse_address_list(&r.to),
        parse_address_list(&r.cc),
        Vec::new(),
        r.subject,
        r.body_html.unwrap_or_default(),
        r.body_text.unwrap_or_default(),
        date,
        timestamp,
        r.attachments,
        read,
        MessageSource::MailboxProtocol,
    )
}

fn map_rfc822(r: ParsedRfc822Record, now: DateTime<Utc>) -> CanonicalMessage {
    let date_time = r.date.unwrap_or(now);
    let date = date_time.to_rfc3339();
    let timestamp = date_time.timestamp_millis();

    base_message(
        None,
        r.message_id,
        r.thread_id,
        r.from,
        r.to,
        r.cc,
        r.bcc,
        r.subject,
        r.body_html.unwrap_or_default(),
        r.body_text.unwrap_or_default(),
        date,
        timestamp,
        r.attachments,
        false,
        MessageSource::Import,
    )
}

#[allow(clippy::too_many_arguments)]
fn base_message(
    id: Option<String>,
    message_id: Option<String>,
    thread_id: Option<String>,
    from: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    subject: Option<String>,
    body_html: String,
    body_text: String,
    date: String,
    timestamp: i64,
    attachments: Vec<RawAttachment>,
    read: bool,
    source: MessageSource,
) -> CanonicalMessage {
    let message_id_for_attachments = message_id.clone().or_else(|| id.clone());
    let owner = message_id_for_attachments.as_deref().unwrap_or("");
    let attachments = attachments
        .into_iter()
        .map(|a| normalize_attachment(a, owner))
        .collect();

    CanonicalMessage {
        id: id.unwrap_or_default(),
        message_id: message_id.unwrap_or_default(),
        thread_id: thread_id.filter(|t| !t.trim().is_empty()),
        from: from.unwrap_or_else(|| Address::new("unknown")),
        to,
        cc,
        bcc,
        subject: subject.unwrap_or_default(),
        body_html,
        body_text,
        body: String::new(),
        html: String::new(),
        text: String::new(),
        date,
        timestamp,
        attachments,
        read,
        has_attachments: false,
        source,
    }
}

/// Ensure `id` and `message_id` are never both empty. When the source
/// provides neither, a synthetic time-based id is assigned — explicitly
/// non-idempotent across re-ingestion.
fn resolve_identity(msg: &mut CanonicalMessage, now: DateTime<Utc>) {
    if msg.id.is_empty() && msg.message_id.is_empty() {
        let synthetic = format!(
            "gen-{}-{}",
            now.timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        msg.id = synthetic.clone();
        msg.message_id = synthetic;
    } else if msg.id.is_empty() {
        msg.id = msg.message_id.clone();
    } else if msg.message_id.is_empty() {
        msg.message_id = msg.id.clone();
    }
}

/// Body resolution priority: explicit HTML → explicit text → generic body
/// tagged by the source's flag → empty (placeholder applied at resync).
fn resolve_bodies(
    html: Option<&str>,
    text: Option<&str>,
    body: Option<&str>,
    body_is_html: Option<bool>,
    snippet: Option<&str>,
) -> (String, String) {
    let mut body_html = html.unwrap_or_default().to_string();
    let mut body_text = text.unwrap_or_default().to_string();

    if body_html.trim().is_empty() && body_text.trim().is_empty() {
        if let Some(generic) = body.filter(|b| !b.trim().is_empty()) {
            if body_is_html.unwrap_or(false) {
                body_html = generic.to_string();
            } else {
                body_text = generic.to_string();
            }
        } else if let Some(snippet) = snippet.filter(|s| !s.trim().is_empty()) {
            body_text = snippet.to_string();
        }
    }

    (body_html, body_text)
}

/// Parse a source date value (RFC 3339/2822 string or epoch number).
/// Invalid or missing dates never produce an invalid canonical date —
/// ingestion time stands in.
fn parse_date_value(value: &Value, now: DateTime<Utc>) -> (String, i64) {
    let parsed: Option<DateTime<Utc>> = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .or_else(|_| DateTime::parse_from_rfc2822(s))
            .map(|d| d.with_timezone(&Utc))
            .ok(),
        Value::Number(n) => n.as_i64().and_then(|n| {
            // Heuristic: values past ~2001-09 in millis are millis.
            if n > 1_000_000_000_000 {
                DateTime::from_timestamp_millis(n)
            } else {
                DateTime::from_timestamp(n, 0)
            }
        }),
        _ => None,
    };

    let date_time = parsed.unwrap_or(now);
    (date_time.to_rfc3339(), date_time.timestamp_millis())
}

/// Normalize one raw attachment, stripping a `data:` URL prefix down to
/// raw base64 and propagating the owning message's id when the source
/// supplied a lazy-fetch id without an owner.
pub fn normalize_attachment(raw: RawAttachment, owner_message_id: &str) -> AttachmentRef {
    let content = raw.content.map(|c| strip_data_url_prefix(&c));
    let size = raw.size.unwrap_or_else(|| {
        // Estimate from base64 length when the source omitted it.
        content
            .as_ref()
            .map(|c| (c.len() as u64 / 4) * 3)
            .unwrap_or(0)
    });

    let message_id = raw
        .message_id
        .filter(|m| !m.is_empty())
        .or_else(|| {
            (raw.attachment_id.is_some() && !owner_message_id.is_empty())
                .then(|| owner_message_id.to_string())
        });

    AttachmentRef {
        filename: raw
            .filename
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| "attachment".to_string()),
        content_type: raw
            .content_type
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        size,
        content,
        attachment_id: raw.attachment_id,
        message_id,
        is_inline: raw.is_inline,
        content_id: raw.content_id,
    }
}

fn strip_data_url_prefix(content: &str) -> String {
    if content.starts_with("data:")
        && let Some(pos) = content.find(";base64,")
    {
        return content[pos + ";base64,".len()..].to_string();
    }
    content.to_string()
}
