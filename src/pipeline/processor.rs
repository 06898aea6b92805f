//! Pipeline facade — wires standardization, reconciliation, and rendering.
//!
//! Ingestion is the only async stage (it may fetch raw messages); rendering
//! and grouping are pure and synchronous. Individual message failures never
//! fail a batch: reconciliation soft-fails per message and standardization
//! is total.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::attachments::AttachmentReconciler;
use crate::capability::{HtmlSanitizer, RawMessageFetcher, RawMessageParser};
use crate::config::PipelineConfig;
use crate::content::display::{DisplayOptions, DisplayOutput, DisplayProcessor};
use crate::content::transform::{
    ContentTransformer, ContentType, TransformOptions, TransformOutput,
};
use crate::message::model::CanonicalMessage;
use crate::message::preview::generate_preview;
use crate::message::standardize::{SourceRecord, standardize};
use crate::thread::{Conversation, group};

/// The full normalization-and-rendering pipeline.
///
/// Construct once and share; all stages are stateless apart from the
/// reconciler's injected capabilities.
pub struct MessagePipeline {
    config: PipelineConfig,
    transformer: ContentTransformer,
    display: DisplayProcessor,
    reconciler: Option<AttachmentReconciler>,
    sanitizer: Option<Arc<dyn HtmlSanitizer>>,
}

impl MessagePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            transformer: ContentTransformer::new(),
            display: DisplayProcessor::new(),
            reconciler: None,
            sanitizer: None,
        }
    }

    /// Attach the raw-message capabilities that enable attachment
    /// reconciliation for cloud-API messages.
    pub fn with_reconciler(
        mut self,
        fetcher: Arc<dyn RawMessageFetcher>,
        parser: Arc<dyn RawMessageParser>,
    ) -> Self {
        self.reconciler = Some(AttachmentReconciler::new(
            fetcher,
            parser,
            self.config.placeholder_body.clone(),
        ));
        self
    }

    /// Attach the HTML sanitizer used by the standard rendering branch.
    /// Without one, HTML passes through with a recorded warning.
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn HtmlSanitizer>) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    // ── Ingestion ───────────────────────────────────────────────────

    /// Standardize a batch of source records and reconcile attachments.
    ///
    /// Total per message: a degenerate record still yields a canonical
    /// message, and a failed reconciliation leaves its message untouched.
    pub async fn ingest(&self, records: Vec<SourceRecord>) -> Vec<CanonicalMessage> {
        let count = records.len();
        info!(count, "Ingesting source records");

        let messages: Vec<CanonicalMessage> = records
            .into_iter()
            .map(|r| standardize(r, &self.config.placeholder_body))
            .collect();

        let messages = match &self.reconciler {
            Some(reconciler) if self.config.reconcile_cloud_api => {
                reconciler.reconcile_batch(messages).await
            }
            _ => messages,
        };

        info!(count = messages.len(), "Ingestion complete");
        messages
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Render a message body through the standard (aggressive) branch.
    ///
    /// Standardization already resolved which body to use and whether it
    /// is HTML, so the classifier is consulted only for messages whose
    /// source never said.
    pub fn render(&self, message: &CanonicalMessage) -> TransformOutput {
        let hint = if !message.body_html.trim().is_empty() {
            Some(ContentType::Html)
        } else if !message.body_text.trim().is_empty() {
            Some(ContentType::Text)
        } else {
            None
        };
        let options = TransformOptions {
            sanitize_mode: self.config.sanitize_mode,
            ..TransformOptions::default()
        };
        self.transformer.transform_with_hint(
            &message.body,
            hint,
            self.sanitizer.as_deref(),
            &options,
        )
    }

    /// Render a message through the structure-preserving display branch.
    pub fn display(&self, message: &CanonicalMessage, options: &DisplayOptions) -> DisplayOutput {
        self.display.process(message, options)
    }

    /// Short plain-text preview for list views.
    pub fn preview(&self, message: &CanonicalMessage) -> String {
        generate_preview(message, self.config.preview_max_len)
    }

    // ── Grouping ────────────────────────────────────────────────────

    /// Fold messages into conversations keyed by thread.
    pub fn group(&self, messages: Vec<CanonicalMessage>) -> HashMap<String, Conversation> {
        group(messages)
    }
}

impl Default for MessagePipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
