//! 目录树节点
//!
//! NCX与EPUB3导航文档都被解析成同一种树结构。节点的 `href` 已经规范化为
//! 相对于EPUB根目录的路径，可能带有 `#片段`；纯标题节点的 `href` 为空。

/// 目录节点：叶子链接或带子节点的链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocNode {
    Leaf {
        title: String,
        href: String,
    },
    Branch {
        title: String,
        href: String,
        children: Vec<TocNode>,
    },
}

impl TocNode {
    /// 创建节点，子节点为空时得到叶子
    pub fn new(title: impl Into<String>, href: impl Into<String>, children: Vec<TocNode>) -> Self {
        let title = title.into();
        let href = href.into();
        if children.is_empty() {
            TocNode::Leaf { title, href }
        } else {
            TocNode::Branch { title, href, children }
        }
    }

    pub fn title(&self) -> &str {
        match self {
            TocNode::Leaf { title, .. } | TocNode::Branch { title, .. } => title,
        }
    }

    pub fn href(&self) -> &str {
        match self {
            TocNode::Leaf { href, .. } | TocNode::Branch { href, .. } => href,
        }
    }

    pub fn children(&self) -> &[TocNode] {
        match self {
            TocNode::Leaf { .. } => &[],
            TocNode::Branch { children, .. } => children,
        }
    }

}

/// 把 `path#fragment` 拆成路径与可选的片段
pub fn split_fragment(href: &str) -> (&str, Option<&str>) {
    match href.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (href, None),
    }
}
