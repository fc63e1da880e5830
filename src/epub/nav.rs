//! EPUB3导航文档解析
//!
//! 读取 `<nav epub:type="toc">` 中嵌套的 `<ol>/<li>` 结构。
//! `<li>` 中的 `<a>` 成为链接节点，`<span>` 成为没有链接的标题节点。

use crate::epub::error::{EpubError, Result};
use crate::epub::path;
use crate::epub::toc::TocNode;
use scraper::{ElementRef, Html};

/// 解析导航文档，返回目录根节点列表
///
/// # 参数
/// * `content` - 导航文档的原始字节
/// * `nav_path` - 导航文档在压缩包内的路径，用于解析相对链接
pub fn parse(content: &[u8], nav_path: &str) -> Result<Vec<TocNode>> {
    let text = String::from_utf8_lossy(content);
    let document = Html::parse_document(&text);

    let navs: Vec<ElementRef> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "nav")
        .collect();

    let toc_nav = navs
        .iter()
        .find(|nav| is_toc_nav(nav))
        .or_else(|| navs.first())
        .ok_or_else(|| EpubError::NavParseError(format!("{} 中没有 <nav> 元素", nav_path)))?;

    let list = child_elements(*toc_nav)
        .find(|element| element.value().name() == "ol")
        .ok_or_else(|| EpubError::NavParseError(format!("{} 的目录导航缺少 <ol>", nav_path)))?;

    Ok(parse_list(list, nav_path))
}

fn is_toc_nav(nav: &ElementRef) -> bool {
    nav.value()
        .attr("epub:type")
        .is_some_and(|value| value.split_whitespace().any(|token| token == "toc"))
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

fn parse_list(list: ElementRef, nav_path: &str) -> Vec<TocNode> {
    child_elements(list)
        .filter(|element| element.value().name() == "li")
        .filter_map(|li| parse_entry(li, nav_path))
        .collect()
}

fn parse_entry(li: ElementRef, nav_path: &str) -> Option<TocNode> {
    let mut label: Option<(String, String)> = None;
    let mut children = Vec::new();

    for child in child_elements(li) {
        match child.value().name() {
            "a" if label.is_none() => {
                let href = child.value().attr("href").unwrap_or_default();
                label = Some((collapse_text(child), path::resolve_href(nav_path, href)));
            }
            "span" if label.is_none() => {
                label = Some((collapse_text(child), String::new()));
            }
            "ol" => children.extend(parse_list(child, nav_path)),
            _ => {}
        }
    }

    // 没有标签也没有子项的 li 直接丢弃
    match label {
        Some((title, href)) => Some(TocNode::new(title, href, children)),
        None if !children.is_empty() => Some(TocNode::new(String::new(), String::new(), children)),
        None => None,
    }
}

fn collapse_text(element: ElementRef) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}
