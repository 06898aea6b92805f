//! RFC-822 raw message parsing, backed by mail-parser.
//!
//! Implements [`RawMessageParser`] by walking the MIME tree and emitting
//! the typed record the standardizer expects. Attachment contents are
//! carried inline as base64 so downstream code never touches raw bytes.

use base64::Engine;
use chrono::{DateTime, Utc};
use mail_parser::{MessageParser, MimeHeaders};

use crate::capability::RawMessageParser;
use crate::error::RawParseError;
use crate::message::model::Address;
use crate::message::standardize::{ParsedRfc822Record, RawAttachment};

/// mail-parser backed implementation of the raw-parse capability.
#[derive(Debug, Default)]
pub struct Rfc822Parser;

impl Rfc822Parser {
    pub fn new() -> Self {
        Self
    }
}

impl RawMessageParser for Rfc822Parser {
    fn parse(&self, raw: &[u8]) -> Result<ParsedRfc822Record, RawParseError> {
        if raw.is_empty() {
            return Err(RawParseError::Empty);
        }
        let parsed = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| RawParseError::Malformed("unparseable message".into()))?;

        let attachments = parsed
            .attachments()
            .map(|part| {
                let contents = part.contents();
                RawAttachment {
                    filename: part.attachment_name().map(|s| s.to_string()),
                    content_type: part.content_type().map(|ct| match ct.subtype() {
                        Some(sub) => format!("{}/{}", ct.ctype(), sub),
                        None => ct.ctype().to_string(),
                    }),
                    size: Some(contents.len() as u64),
                    content: Some(
                        base64::engine::general_purpose::STANDARD.encode(contents),
                    ),
                    attachment_id: None,
                    message_id: None,
                    is_inline: part
                        .content_disposition()
                        .is_some_and(|cd| cd.ctype().eq_ignore_ascii_case("inline")),
                    content_id: part.content_id().map(|s| s.to_string()),
                }
            })
            .collect();

        Ok(ParsedRfc822Record {
            message_id: parsed.message_id().map(|s| s.to_string()),
            // In-Reply-To is the closest thing RFC-822 has to a thread key.
            thread_id: parsed.in_reply_to().as_text().map(|s| s.to_string()),
            from: parsed
                .from()
                .and_then(|a| a.first())
                .and_then(typed_address),
            to: address_list(parsed.to()),
            cc: address_list(parsed.cc()),
            bcc: address_list(parsed.bcc()),
            subject: parsed.subject().map(|s| s.to_string()),
            date: parsed
                .date()
                .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0)),
            body_html: parsed.body_html(0).map(|s| s.to_string()),
            body_text: parsed.body_text(0).map(|s| s.to_string()),
            attachments,
        })
    }
}

fn typed_address(addr: &mail_parser::Addr) -> Option<Address> {
    let email = addr.address.as_ref()?.to_string();
    Some(match &addr.name {
        Some(name) if !name.trim().is_empty() => Address::named(email, name.to_string()),
        _ => Address::new(email),
    })
}

/// Flatten a mail-parser address header (list or group) into typed addresses.
fn address_list(addr: Option<&mail_parser::Address>) -> Vec<Address> {
    let Some(addr) = addr else {
        return Vec::new();
    };
    match addr {
        mail_parser::Address::List(addrs) => {
            addrs.iter().filter_map(typed_address).collect()
        }
        mail_parser::Address::Group(groups) => groups
            .iter()
            .flat_map(|g| g.addresses.iter().filter_map(typed_address))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &[u8] = b"Message-ID: <abc@example.com>\r\n\
From: Alice <alice@example.com>\r\n\
To: Bob <bob@example.com>, carol@example.com\r\n\
Subject: Lunch\r\n\
Date: Mon, 6 Jan 2025 10:00:00 +0000\r\n\
Content-Type: text/plain\r\n\
\r\n\
Are you free at noon?\r\n";

    const WITH_ATTACHMENT: &[u8] = b"Message-ID: <att@example.com>\r\n\
From: alice@example.com\r\n\
Subject: Report\r\n\
Content-Type: multipart/mixed; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain\r\n\
\r\n\
See attached.\r\n\
--b1\r\n\
Content-Type: application/pdf\r\n\
Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
\r\n\
%PDF-1.4 fake\r\n\
--b1--\r\n";

    #[test]
    fn parses_headers_and_body() {
        let rec = Rfc822Parser::new().parse(SIMPLE).unwrap();
        assert_eq!(rec.message_id.as_deref(), Some("abc@example.com"));
        assert_eq!(rec.subject.as_deref(), Some("Lunch"));
        let from = rec.from.unwrap();
        assert_eq!(from.email, "alice@example.com");
        assert_eq!(from.name.as_deref(), Some("Alice"));
        assert_eq!(rec.to.len(), 2);
        assert_eq!(rec.to[1].email, "carol@example.com");
        assert!(rec.body_text.unwrap().contains("free at noon"));
        assert!(rec.date.is_some());
    }

    #[test]
    fn extracts_attachments_as_base64() {
        let rec = Rfc822Parser::new().parse(WITH_ATTACHMENT).unwrap();
        assert_eq!(rec.attachments.len(), 1);
        let att = &rec.attachments[0];
        assert_eq!(att.filename.as_deref(), Some("report.pdf"));
        assert_eq!(att.content_type.as_deref(), Some("application/pdf"));
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(att.content.as_deref().unwrap())
            .unwrap();
        assert!(decoded.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            Rfc822Parser::new().parse(b""),
            Err(RawParseError::Empty)
        ));
    }

    #[test]
    fn in_reply_to_becomes_thread_id() {
        let raw = b"Message-ID: <reply@example.com>\r\n\
In-Reply-To: <root@example.com>\r\n\
From: bob@example.com\r\n\
Subject: Re: Lunch\r\n\
Content-Type: text/plain\r\n\
\r\n\
Yes.\r\n";
        let rec = Rfc822Parser::new().parse(raw).unwrap();
        assert_eq!(rec.thread_id.as_deref(), Some("root@example.com"));
    }
}
