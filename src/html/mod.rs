//! HTML内容文档处理
//!
//! 基于scraper的容错解析，配合不修改文档树的序列化器完成元素与属性的清理。

pub mod sanitize;
mod serialize;

pub use sanitize::{sanitize, SanitizeOptions, Sanitized};
pub(crate) use serialize::escape_text;
