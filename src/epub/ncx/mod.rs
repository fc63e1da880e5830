//! NCX（Navigation Control file for XML）文件解析模块
//!
//! NCX文件主要用于定义EPUB 2的目录结构。解析结果是通用的 [`TocNode`](crate::epub::TocNode) 树。

mod parser;

pub use parser::Ncx;
