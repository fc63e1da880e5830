//! 静态站点生成
//!
//! 输出结构：
//! - `<输出目录>/index.html`：书架
//! - `<输出目录>/<书名>/index.html`：书籍目录
//! - `<输出目录>/<书名>/chapters/<n>.html`：章节页面

pub mod config;
pub mod emitter;
pub mod library;
pub mod order;
pub mod resolve;
pub mod templates;

pub use config::{Labels, PageMode, ShelfOrder, SiteConfig};
pub use emitter::SiteEmitter;
pub use library::{convert_library, BatchEvent, BookRecord, LibraryReport};
pub use order::{NamingStrategy, ReadingOrder};
pub use resolve::{resolve, Resolution, TocEntry};
pub use templates::Templates;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// 章节页面所在的子目录
pub const CHAPTERS_DIR: &str = "chapters";

/// 目录页与书架页的文件名
pub const INDEX_FILE: &str = "index.html";

/// 链接中的单个路径段需要转义的字符
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// 把文件名编码为可用于href的路径段
pub(crate) fn encode_segment(name: &str) -> String {
    utf8_percent_encode(name, PATH_SEGMENT).to_string()
}

/// 转义放入HTML文本的内容
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    crate::html::escape_text(text, &mut out);
    out
}
