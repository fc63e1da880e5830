//! 目录解析
//!
//! 深度优先遍历目录树，把每个节点的链接解析到清单中的内容文档，得到
//! 文件名到标题的映射，以及与目录结构一致的渲染列表。

use std::collections::HashMap;

use crate::epub::archive::Archive;
use crate::epub::toc::{split_fragment, TocNode};

/// 渲染用的目录条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    /// 目标文档的文件名，未解析到文档时为 `None`
    pub target: Option<String>,
    /// 链接中的 `#片段`
    pub fragment: Option<String>,
    pub children: Vec<TocEntry>,
}

/// 解析结果
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// 文档文件名到目录标题，同一文档出现多次时以最后一次为准
    pub titles: HashMap<String, String>,
    pub entries: Vec<TocEntry>,
}

/// 解析目录树
pub fn resolve(nodes: &[TocNode], archive: &Archive) -> Resolution {
    let mut titles = HashMap::new();
    let entries = walk(nodes, archive, &mut titles);
    Resolution { titles, entries }
}

fn walk(nodes: &[TocNode], archive: &Archive, titles: &mut HashMap<String, String>) -> Vec<TocEntry> {
    nodes
        .iter()
        .map(|node| {
            let (path, fragment) = split_fragment(node.href());
            let target = archive
                .item_by_path(path)
                .filter(|item| item.is_document())
                .map(|item| item.basename().to_string());

            if let Some(name) = &target {
                titles.insert(name.clone(), node.title().to_string());
            }
            // 先记录父节点再处理子节点，保证后访问的节点覆盖标题
            let children = walk(node.children(), archive, titles);

            TocEntry {
                title: node.title().to_string(),
                target,
                fragment: fragment.filter(|f| !f.is_empty()).map(str::to_string),
                children,
            }
        })
        .collect()
}
