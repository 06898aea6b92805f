//! mailcanon — canonical mail normalization and rendering.

pub mod attachments;
pub mod capability;
pub mod classify;
pub mod config;
pub mod content;
pub mod error;
pub mod message;
pub mod pipeline;
pub mod rfc822;
pub mod thread;
