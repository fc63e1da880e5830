//! quick-xml 的小工具函数
//!
//! container.xml、OPF和NCX解析器共用的属性读取逻辑。

use crate::epub::error::{EpubError, Result};
use quick_xml::events::BytesStart;

/// 读取元素的全部属性，键为去掉命名空间前缀的本地名称
pub(crate) fn attributes(e: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|err| EpubError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map(|value| value.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.push((key, value));
    }
    Ok(attrs)
}

/// 读取单个属性值
pub(crate) fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>> {
    Ok(attributes(e)?
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value))
}

/// 元素的本地名称（忽略 `dc:` 之类的前缀）
pub(crate) fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

/// 元素名的命名空间前缀，例如 `dc:title` 返回 `Some("dc")`
pub(crate) fn prefix(e: &BytesStart) -> Option<String> {
    e.name()
        .prefix()
        .map(|p| String::from_utf8_lossy(p.as_ref()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;
    use quick_xml::reader::Reader;

    #[test]
    fn test_read_attributes() {
        let mut reader = Reader::from_str(r#"<dc:item opf:id="a" href="x.html"/>"#);
        match reader.read_event().unwrap() {
            Event::Empty(e) => {
                assert_eq!(local_name(&e), "item");
                assert_eq!(prefix(&e), Some("dc".to_string()));
                assert_eq!(attribute(&e, "id").unwrap(), Some("a".to_string()));
                assert_eq!(attribute(&e, "href").unwrap(), Some("x.html".to_string()));
                assert_eq!(attribute(&e, "missing").unwrap(), None);
            }
            other => panic!("期望空元素，得到 {:?}", other),
        }
    }
}
