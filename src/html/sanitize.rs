//! 内容文档清理
//!
//! 容错解析单个XHTML/HTML文档，删除不需要的元素和属性，替换标题并补上视口声明。
//! 同时返回完整文档和 `<body>` 的内部内容，调用方按页面模式选用。

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use ego_tree::{NodeId, NodeRef};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::Html;
use scraper::node::Node;

use crate::epub::error::{EpubError, Result};
use crate::html::serialize::{is_void, Rewrite};

/// XHTML的自闭合写法，如 `<title/>`、`<a id="p1"/>`
static SELF_CLOSING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9:_.-]*)(\s[^<>]*?)?/>").expect("自闭合标签正则表达式无效"));

/// 源文档中的 `<head>` 开始标签
static HEAD_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<head[\s>/]").expect("head标签正则表达式无效"));

/// 图片与矢量图元素
pub const MEDIA_ELEMENTS: &[&str] = &["img", "image", "svg"];

/// 严格模式额外删除的嵌入样式与脚本
pub const STRICT_ELEMENTS: &[&str] = &["style", "link", "script"];

/// 瘦身时从文档中删除的元素
pub const SLIM_ELEMENTS: &[&str] = &["img", "image", "svg", "video", "audio", "iframe"];

/// 清理选项
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// 连同子树一起删除的元素名
    pub removed_elements: HashSet<String>,
    /// 保留的属性名，`None` 表示保留全部属性
    pub allowed_attrs: Option<HashSet<String>>,
    /// 页面标题
    pub title: Option<String>,
    /// 删除空段落
    pub drop_empty_paragraphs: bool,
    /// 缺少视口声明时补上
    pub ensure_viewport: bool,
    /// 追加到 `<head>` 末尾的原始HTML
    pub head_extra: Option<String>,
    /// 追加到 `<body>` 末尾的原始HTML
    pub body_extra: Option<String>,
    /// 输出中保留XML声明
    pub keep_xml_declaration: bool,
    /// 内容文档文件名到输出链接的映射，用于改写 `href`
    pub link_targets: Option<HashMap<String, String>>,
}

impl SanitizeOptions {
    /// 生成章节页面用的选项，`strict` 时同时删除样式、外链与脚本
    pub fn chapter(strict: bool) -> Self {
        let mut removed: HashSet<String> = MEDIA_ELEMENTS.iter().map(|name| name.to_string()).collect();
        if strict {
            removed.extend(STRICT_ELEMENTS.iter().map(|name| name.to_string()));
        }
        SanitizeOptions {
            removed_elements: removed,
            allowed_attrs: None,
            title: None,
            drop_empty_paragraphs: true,
            ensure_viewport: true,
            head_extra: None,
            body_extra: None,
            keep_xml_declaration: false,
            link_targets: None,
        }
    }

    /// 瘦身用的选项：只删除媒体元素，其余保持原样
    pub fn slim() -> Self {
        SanitizeOptions {
            removed_elements: SLIM_ELEMENTS.iter().map(|name| name.to_string()).collect(),
            allowed_attrs: None,
            title: None,
            drop_empty_paragraphs: false,
            ensure_viewport: false,
            head_extra: None,
            body_extra: None,
            keep_xml_declaration: true,
            link_targets: None,
        }
    }

    /// 只保留给定的属性
    pub fn allowed_attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_attrs = Some(attrs.into_iter().map(Into::into).collect());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn head_extra(mut self, html: impl Into<String>) -> Self {
        self.head_extra = Some(html.into());
        self
    }

    pub fn body_extra(mut self, html: impl Into<String>) -> Self {
        self.body_extra = Some(html.into());
        self
    }

    /// 指向其他内容文档的链接改写为输出文件名，片段保留
    ///
    /// 键是源文件名（已解码），值是已编码的输出链接。
    pub fn link_targets(mut self, targets: HashMap<String, String>) -> Self {
        self.link_targets = Some(targets);
        self
    }
}

/// 清理结果
#[derive(Debug, Clone)]
pub struct Sanitized {
    /// 完整的清理后文档
    pub markup: String,
    /// `<body>` 的内部内容
    pub body: String,
}

/// 遍历时收集到的信息
#[derive(Default)]
struct Marks {
    removed: HashSet<NodeId>,
    title: Option<NodeId>,
    body: Option<NodeId>,
    has_viewport: bool,
}

/// 清理一个内容文档
///
/// 解析是容错的，残缺的标记不会报错。只有包含NUL字节的二进制内容才返回
/// [`EpubError::UnparsableDocument`]。源文档没有 `<head>` 时不补标题和视口声明。
pub fn sanitize(raw: &[u8], options: &SanitizeOptions) -> Result<Sanitized> {
    if raw.contains(&0) {
        return Err(EpubError::UnparsableDocument("内容包含二进制数据".to_string()));
    }
    let text = String::from_utf8_lossy(raw);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let text = expand_self_closing(text);
    let has_head = HEAD_TAG.is_match(&text);
    let document = Html::parse_document(&text);

    let mut marks = Marks::default();
    mark(document.tree.root(), options, &mut marks);

    let rewrite = Rewrite {
        removed: &marks.removed,
        allowed_attrs: options.allowed_attrs.as_ref(),
        title: options.title.as_deref(),
        title_node: marks.title,
        insert_title: has_head,
        insert_viewport: has_head && options.ensure_viewport && !marks.has_viewport,
        head_extra: options.head_extra.as_deref(),
        body_extra: options.body_extra.as_deref(),
        keep_xml_declaration: options.keep_xml_declaration,
        links: options.link_targets.as_ref(),
    };

    let markup = rewrite.document(document.tree.root());
    let body = match marks.body.and_then(|id| document.tree.get(id)) {
        Some(body) => rewrite.inner(body),
        None => markup.clone(),
    };
    Ok(Sanitized { markup, body })
}

/// HTML解析器忽略非空元素上的 `/>`，先改写成成对的标签
fn expand_self_closing(text: &str) -> Cow<'_, str> {
    SELF_CLOSING.replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        if is_void(name) {
            caps[0].to_string()
        } else {
            let attrs = caps.get(2).map_or("", |m| m.as_str());
            format!("<{name}{attrs}></{name}>")
        }
    })
}

/// 深度优先标记要删除的节点，被删除的子树不再进入
fn mark(node: NodeRef<Node>, options: &SanitizeOptions, marks: &mut Marks) {
    for child in node.children() {
        let Node::Element(element) = child.value() else {
            continue;
        };
        let name = element.name();
        if options.removed_elements.contains(name) {
            marks.removed.insert(child.id());
            continue;
        }
        mark(child, options, marks);

        match name {
            "p" if options.drop_empty_paragraphs && is_empty_paragraph(child, &marks.removed) => {
                marks.removed.insert(child.id());
            }
            "title" if marks.title.is_none() => marks.title = Some(child.id()),
            "body" if marks.body.is_none() => marks.body = Some(child.id()),
            "meta" => {
                let is_viewport = element
                    .attr("name")
                    .is_some_and(|value| value.trim().eq_ignore_ascii_case("viewport"));
                let name_survives = options.allowed_attrs.as_ref().is_none_or(|allowed| allowed.contains("name"));
                if is_viewport && name_survives {
                    marks.has_viewport = true;
                }
            }
            _ => {}
        }
    }
}

/// 去掉空白后没有文本、也没有子元素的段落
fn is_empty_paragraph(paragraph: NodeRef<Node>, removed: &HashSet<NodeId>) -> bool {
    paragraph
        .children()
        .filter(|child| !removed.contains(&child.id()))
        .all(|child| match child.value() {
            Node::Text(text) => text.trim().is_empty(),
            Node::Element(_) | Node::Comment(_) => false,
            _ => true,
        })
}
