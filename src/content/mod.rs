//! Content transformation: classification-driven rendering, linkification,
//! signature handling, and the structure-preserving display pipeline.

pub mod display;
pub mod linkify;
pub mod signature;
pub mod transform;

pub use display::{DisplayOptions, DisplayOutput, DisplayProcessor};
pub use transform::{ContentTransformer, ContentType, TransformOptions, TransformOutput};
