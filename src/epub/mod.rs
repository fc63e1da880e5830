pub mod archive;
pub mod container;
pub mod error;
pub mod nav;
pub mod ncx;
pub mod opf;
pub mod path;
pub mod reader;
pub mod toc;
mod writer;
mod xml;

// 重新导出错误处理
pub use error::{EpubError, ErrorKind, Result};

// 重新导出容器相关
pub use container::{Container, RootFile};

// 重新导出EPUB读取器和内容模型
pub use archive::{Archive, Item, Resource};
pub use reader::Epub;

// 重新导出OPF相关
pub use opf::{ItemKind, ManifestItem, Metadata, Namespace, Opf, Spine, SpineItem};

// 重新导出目录相关
pub use ncx::Ncx;
pub use toc::TocNode;
