pub mod epub;
pub mod fsutil;
pub mod html;
pub mod site;
pub mod slim;

#[cfg(test)]
mod testing;

// === 核心API重新导出 ===

/// 内存中的EPUB快照（主要接口）
pub use epub::{Archive, Item, ItemKind, Resource};

/// 错误处理
pub use epub::{EpubError, ErrorKind, Result};

/// 目录节点
pub use epub::TocNode;

// === 底层组件 ===

pub use epub::{Container, Epub, Ncx, Opf};

// === 站点生成 ===

pub use site::{
    convert_library, BatchEvent, BookRecord, LibraryReport, NamingStrategy, PageMode, SiteConfig, SiteEmitter,
};

// === 瘦身 ===

pub use slim::{SlimOptions, SlimReport, TransformPolicy};

// === 库信息 ===

/// 版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// === 便捷函数 ===

/// 打开EPUB文件并读入内存
///
/// 这是 `Archive::open` 的便捷包装函数。
///
/// # 示例
///
/// ```no_run
/// let archive = bookshelf::open("book.epub")?;
/// println!("书名: {}", archive.title().unwrap_or("未知"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Archive> {
    Archive::open(path)
}
