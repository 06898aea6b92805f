//! Attachment reconciler — the fetch-and-reparse fallback.
//!
//! The cloud API's lightweight message format sometimes omits attachment
//! parts that a full raw-message parse reveals. When a cloud-API message
//! reports zero attachments, the reconciler fetches the raw message,
//! re-parses it, and merges any discovered attachments back in. Every
//! failure along the way is soft: log and return the message unchanged.
//! A message that already has attachments is returned immediately — no
//! second fetch, ever.

use std::sync::Arc;

use base64::Engine;
use tracing::{debug, info, warn};

use crate::capability::{RawEmail, RawMessageFetcher, RawMessageParser};
use crate::message::model::{CanonicalMessage, MessageSource};
use crate::message::standardize::normalize_attachment;

/// Reconciles under-reported attachments via raw-message re-parse.
pub struct AttachmentReconciler {
    fetcher: Arc<dyn RawMessageFetcher>,
    parser: Arc<dyn RawMessageParser>,
    placeholder: String,
}

impl AttachmentReconciler {
    pub fn new(
        fetcher: Arc<dyn RawMessageFetcher>,
        parser: Arc<dyn RawMessageParser>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            parser,
            placeholder: placeholder.into(),
        }
    }

    /// Reconcile one message.
    ///
    /// Runs only for cloud-API messages currently reporting zero
    /// attachments; everything else passes through untouched, which is
    /// what makes repeated reconciliation a no-op.
    pub async fn reconcile(&self, mut message: CanonicalMessage) -> CanonicalMessage {
        if message.source != MessageSource::CloudApi || !message.attachments.is_empty() {
            return message;
        }

        let raw = match self.fetcher.fetch_raw(&message.message_id).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(message_id = %message.message_id, error = %e, "Raw message fetch failed, keeping message as-is");
                return message;
            }
        };

        let bytes = match raw {
            RawEmail::Bytes(b) => b,
            RawEmail::Base64(s) => {
                match base64::engine::general_purpose::STANDARD.decode(s.trim()) {
                    Ok(b) => b,
                    Err(e) => {
                        warn!(message_id = %message.message_id, error = %e, "Raw message base64 decode failed, keeping message as-is");
                        return message;
                    }
                }
            }
        };

        let parsed = match self.parser.parse(&bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(message_id = %message.message_id, error = %e, "Raw message parse failed, keeping message as-is");
                return message;
            }
        };

        if parsed.attachments.is_empty() {
            // Not an error: the message genuinely has no attachments.
            debug!(message_id = %message.message_id, "Raw parse confirmed no attachments");
            return message;
        }

        let count = parsed.attachments.len();
        message.attachments = parsed
            .attachments
            .into_iter()
            .map(|a| normalize_attachment(a, &message.message_id))
            .collect();
        message.resync(&self.placeholder);

        info!(message_id = %message.message_id, count, "Recovered attachments via raw-message re-parse");
        message
    }

    /// Reconcile a batch with per-message fan-out. No ordering guarantee
    /// between messages; each message's result is complete (or soft-failed)
    /// when this returns.
    pub async fn reconcile_batch(&self, messages: Vec<CanonicalMessage>) -> Vec<CanonicalMessage> {
        futures::future::join_all(messages.into_iter().map(|m| self.reconcile(m))).await
    }
}
