//! NCX解析器模块
//!
//! 提供NCX（Navigation Control file for XML）文件的XML解析功能。
//! 只关心 `<navMap>`：页面列表（pageList/navList）不参与目录生成。

use crate::epub::error::{EpubError, Result};
use crate::epub::path;
use crate::epub::toc::TocNode;
use crate::epub::xml;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// NCX文件解析结果
#[derive(Debug, Clone)]
pub struct Ncx {
    /// 导航地图，按文档顺序保存
    pub nav_map: Vec<TocNode>,
}

/// 尚未闭合的navPoint
#[derive(Default)]
struct OpenNavPoint {
    title: String,
    src: String,
    children: Vec<TocNode>,
}

impl Ncx {
    /// 解析NCX文件内容
    ///
    /// # 参数
    /// * `xml_content` - NCX文件的XML内容
    /// * `ncx_path` - NCX文件在压缩包内的路径，用于解析相对的 `src`
    pub fn parse_xml(xml_content: &str, ncx_path: &str) -> Result<Ncx> {
        Self::parse_events(xml_content, ncx_path).map_err(|e| match e {
            EpubError::XmlError(xml_err) => EpubError::NcxParseError(format!("XML解析错误: {}", xml_err)),
            other => other,
        })
    }

    fn parse_events(xml_content: &str, ncx_path: &str) -> Result<Ncx> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut roots: Vec<TocNode> = Vec::new();
        let mut stack: Vec<OpenNavPoint> = Vec::new();

        let mut in_nav_map = false;
        let mut in_label = false;
        let mut text_content = String::new();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    match e.local_name().as_ref() {
                        b"navMap" => in_nav_map = true,
                        b"navPoint" if in_nav_map => stack.push(OpenNavPoint::default()),
                        b"navLabel" if in_nav_map => in_label = true,
                        b"content" if in_nav_map => {
                            if let Some(point) = stack.last_mut() {
                                point.src = xml::attribute(e, "src")?.unwrap_or_default();
                            }
                        }
                        _ => {}
                    }
                    text_content.clear();
                }
                Event::Empty(ref e) => {
                    if in_nav_map && e.local_name().as_ref() == b"content" {
                        if let Some(point) = stack.last_mut() {
                            point.src = xml::attribute(e, "src")?.unwrap_or_default();
                        }
                    }
                }
                Event::Text(e) => {
                    text_content.push_str(&e.unescape()?);
                }
                Event::CData(e) => {
                    text_content.push_str(&String::from_utf8_lossy(&e));
                }
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"text" if in_label => {
                        if let Some(point) = stack.last_mut() {
                            if point.title.is_empty() {
                                point.title = text_content.trim().to_string();
                            }
                        }
                    }
                    b"navLabel" => in_label = false,
                    b"navMap" => in_nav_map = false,
                    b"navPoint" if in_nav_map => {
                        if let Some(point) = stack.pop() {
                            let href = path::resolve_href(ncx_path, &point.src);
                            let node = TocNode::new(point.title, href, point.children);
                            match stack.last_mut() {
                                Some(parent) => parent.children.push(node),
                                None => roots.push(node),
                            }
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Ncx { nav_map: roots })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:uuid:1"/></head>
  <docTitle><text>示例书籍</text></docTitle>
  <navMap>
    <navPoint id="p1" playOrder="2">
      <navLabel><text>第一部</text></navLabel>
      <content src="text/part1.xhtml"/>
      <navPoint id="p1-1" playOrder="3">
        <navLabel><text>第一章 &amp; 序</text></navLabel>
        <content src="text/ch1.xhtml#start"/>
      </navPoint>
      <navPoint id="p1-2" playOrder="4">
        <navLabel><text>第二章</text></navLabel>
        <content src="text/ch2.xhtml"/>
      </navPoint>
    </navPoint>
    <navPoint id="p0" playOrder="1">
      <navLabel><text>附录</text></navLabel>
      <content src="../appendix.xhtml"/>
    </navPoint>
  </navMap>
  <pageList>
    <pageTarget id="pg1" type="normal" value="1">
      <navLabel><text>1</text></navLabel>
      <content src="text/ch1.xhtml#pg1"/>
    </pageTarget>
  </pageList>
</ncx>"#;

    #[test]
    fn test_parse_nested_nav_map() {
        let ncx = Ncx::parse_xml(SAMPLE_NCX, "OEBPS/toc.ncx").expect("解析NCX失败");
        assert_eq!(ncx.nav_map.len(), 2);

        let part = &ncx.nav_map[0];
        assert_eq!(part.title(), "第一部");
        assert_eq!(part.href(), "OEBPS/text/part1.xhtml");
        assert_eq!(part.children().len(), 2);
        assert_eq!(part.children()[0].title(), "第一章 & 序");
        assert_eq!(part.children()[0].href(), "OEBPS/text/ch1.xhtml#start");
    }

    #[test]
    fn test_document_order_is_kept_over_play_order() {
        let ncx = Ncx::parse_xml(SAMPLE_NCX, "OEBPS/toc.ncx").unwrap();
        let titles: Vec<&str> = ncx.nav_map.iter().map(TocNode::title).collect();
        assert_eq!(titles, vec!["第一部", "附录"]);
        assert_eq!(ncx.nav_map[1].href(), "appendix.xhtml");
    }

    #[test]
    fn test_page_list_is_ignored() {
        let ncx = Ncx::parse_xml(SAMPLE_NCX, "OEBPS/toc.ncx").unwrap();
        fn count(node: &TocNode) -> usize {
            1 + node.children().iter().map(count).sum::<usize>()
        }
        let total: usize = ncx.nav_map.iter().map(count).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_empty_nav_map() {
        let ncx = Ncx::parse_xml(r#"<ncx><navMap></navMap></ncx>"#, "toc.ncx").unwrap();
        assert!(ncx.nav_map.is_empty());
    }
}
