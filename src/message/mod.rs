//! Canonical message model and standardization.

pub mod address;
pub mod model;
pub mod preview;
pub mod standardize;

pub use model::{Address, AttachmentRef, CanonicalMessage, MessageSource};
pub use preview::generate_preview;
pub use standardize::{SourceRecord, standardize};
