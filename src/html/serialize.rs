//! 文档树序列化
//!
//! 遍历scraper解析出的树而不修改它：被移除的节点直接跳过，属性在输出时过滤。
//! 空元素写成 `<br/>` 形式，属性值总是带引号，输出同时可被HTML与XHTML阅读器接受。

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use ego_tree::{NodeId, NodeRef};
use percent_encoding::percent_decode_str;
use scraper::node::{Element, Node};

use crate::epub::path;
use crate::epub::toc::split_fragment;

/// 不需要结束标签的空元素
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// 是否为空元素，不区分大小写
pub(crate) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(name))
}

/// 内容按原样输出、不做转义的元素
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// 注入的视口声明
pub(crate) const VIEWPORT_META: &str = r#"<meta name="viewport" content="width=device-width, initial-scale=1.0"/>"#;

/// 序列化过程中对文档所做的改写
pub(crate) struct Rewrite<'a> {
    /// 被移除的节点（连同其子树）
    pub removed: &'a HashSet<NodeId>,
    /// 保留的属性名，`None` 表示全部保留
    pub allowed_attrs: Option<&'a HashSet<String>>,
    /// 替换或插入的页面标题
    pub title: Option<&'a str>,
    /// 文档中第一个 `<title>` 元素
    pub title_node: Option<NodeId>,
    /// 没有 `<title>` 时是否在 `<head>` 末尾补上
    pub insert_title: bool,
    /// 是否需要在 `<head>` 开头插入视口声明
    pub insert_viewport: bool,
    /// 追加到 `<head>` 末尾的原始HTML
    pub head_extra: Option<&'a str>,
    /// 追加到 `<body>` 末尾的原始HTML
    pub body_extra: Option<&'a str>,
    /// 保留源文档开头的XML声明
    pub keep_xml_declaration: bool,
    /// 源文件名到输出链接，`href` 指向其中的文档时改写
    pub links: Option<&'a HashMap<String, String>>,
}

impl Rewrite<'_> {
    /// 序列化整个文档
    pub fn document(&self, root: NodeRef<Node>) -> String {
        self.inner(root)
    }

    /// 只序列化某个节点的子节点
    pub fn inner(&self, node: NodeRef<Node>) -> String {
        let mut out = String::new();
        self.children(node, &mut out);
        out
    }

    fn children(&self, node: NodeRef<Node>, out: &mut String) {
        for child in node.children() {
            self.node(child, out);
        }
    }

    fn node(&self, node: NodeRef<Node>, out: &mut String) {
        if self.removed.contains(&node.id()) {
            return;
        }
        match node.value() {
            Node::Document | Node::Fragment => self.children(node, out),
            Node::Doctype(doctype) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(doctype.name());
                out.push('>');
            }
            Node::Comment(comment) => {
                // html5ever把XML声明当作注释读入
                if comment.starts_with("?xml") {
                    if self.keep_xml_declaration {
                        out.push('<');
                        out.push_str(comment);
                        out.push_str(">\n");
                    }
                } else {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                }
            }
            Node::Text(text) => {
                let raw = node
                    .parent()
                    .and_then(|parent| parent.value().as_element().map(Element::name))
                    .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
                if raw {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            Node::ProcessingInstruction(pi) => {
                out.push_str("<?");
                out.push_str(&pi.target);
                out.push(' ');
                out.push_str(&pi.data);
                out.push_str("?>");
            }
            Node::Element(element) => self.element(node, element, out),
        }
    }

    fn element(&self, node: NodeRef<Node>, element: &Element, out: &mut String) {
        let name = element.name();
        self.start_tag(element, out);
        if VOID_ELEMENTS.contains(&name) {
            return;
        }

        if name == "head" && self.insert_viewport {
            out.push_str(VIEWPORT_META);
        }

        match self.title {
            Some(title) if Some(node.id()) == self.title_node => escape_text(title, out),
            _ => self.children(node, out),
        }

        match name {
            "head" => {
                if self.title_node.is_none() && self.insert_title {
                    if let Some(title) = self.title {
                        out.push_str("<title>");
                        escape_text(title, out);
                        out.push_str("</title>");
                    }
                }
                if let Some(extra) = self.head_extra {
                    out.push_str(extra);
                }
            }
            "body" => {
                if let Some(extra) = self.body_extra {
                    out.push_str(extra);
                }
            }
            _ => {}
        }

        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }

    fn start_tag(&self, element: &Element, out: &mut String) {
        let name = element.name();
        out.push('<');
        out.push_str(name);
        for (key, value) in element.attrs() {
            if self.allowed_attrs.is_some_and(|allowed| !allowed.contains(key)) {
                continue;
            }
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            if key == "href" {
                escape_attr(&self.link(value), out);
            } else {
                escape_attr(value, out);
            }
            out.push('"');
        }
        if VOID_ELEMENTS.contains(&name) {
            out.push_str("/>");
        } else {
            out.push('>');
        }
    }
}

impl Rewrite<'_> {
    /// 指向已知文档的相对链接换成输出文件名，保留片段
    fn link<'v>(&self, href: &'v str) -> Cow<'v, str> {
        let Some(links) = self.links else {
            return Cow::Borrowed(href);
        };
        let (target, fragment) = split_fragment(href.trim());
        if target.is_empty() || path::is_external(target) {
            return Cow::Borrowed(href);
        }
        let decoded = percent_decode_str(target).decode_utf8_lossy();
        match links.get(path::basename(&decoded)) {
            Some(output) => {
                let mut rewritten = output.clone();
                if let Some(fragment) = fragment {
                    rewritten.push('#');
                    rewritten.push_str(fragment);
                }
                Cow::Owned(rewritten)
            }
            None => Cow::Borrowed(href),
        }
    }
}

/// 转义文本内容
pub(crate) fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// 转义属性值
pub(crate) fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
