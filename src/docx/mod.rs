//! Reading, editing and writing `.docx` documents.
//!
//! Layers, bottom up:
//!
//! | Module | Role |
//! |--------|------|
//! | [`package`] | zip container, part lookup, order-preserving rewrite |
//! | [`xml`] | lossless element tree over quick-xml |
//! | [`model`] | paragraph, run, hyperlink and bookmark views |
//! | [`body`] | block arena with stable handles and a chaining cursor |
//! | [`document`] | the main part: blocks, bookmark registry, fonts |
//! | [`bookmark`] | bookmark naming rules |

pub mod body;
pub mod bookmark;
pub mod document;
pub mod model;
pub mod package;
pub mod xml;

pub use body::{Block, BlockId, Body, Cursor};
pub use bookmark::{is_valid_bookmark_name, sanitize_bookmark_name};
pub use document::Document;
pub use model::{Alignment, Hyperlink, LinkStyle, Paragraph, Run, RunProps};
pub use package::DocxPackage;
