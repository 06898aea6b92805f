//! Unified message pipeline.
//!
//! All inbound mail from any source flows through:
//! 1. `standardize()` — raw source record to canonical message
//! 2. `AttachmentReconciler` — fetch-and-reparse fallback for cloud mail
//! 3. `ContentTransformer` / `DisplayProcessor` — rendering on demand
//! 4. `thread::group()` — conversation assembly

pub mod processor;

pub use processor::MessagePipeline;
