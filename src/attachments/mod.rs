//! Attachment reconciliation and lazy content fetch.

pub mod cache;
pub mod reconcile;

pub use cache::AttachmentStore;
pub use reconcile::AttachmentReconciler;
