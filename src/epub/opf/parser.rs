//! OPF解析器模块
//!
//! 提供OPF（Open Packaging Format）文件的XML解析功能。

use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{
    manifest::{ItemKind, ManifestItem},
    metadata::{Metadata, Namespace},
    spine::{Spine, SpineItem},
};
use crate::epub::xml;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashMap;

/// OPF文件解析结果
#[derive(Debug, Clone)]
pub struct Opf {
    /// EPUB版本
    pub version: String,
    /// 元数据
    pub metadata: Metadata,
    /// 清单项，保持文件中的顺序
    pub manifest: Vec<ManifestItem>,
    /// 脊柱(阅读顺序)
    pub spine: Spine,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Metadata,
    Manifest,
    Spine,
}

/// 正在读取文本内容的元数据元素
struct PendingElement {
    namespace: Namespace,
    name: String,
    attributes: HashMap<String, String>,
    text: String,
}

impl Opf {
    /// 解析OPF文件内容
    ///
    /// 重复ID的清单项只保留第一个，缺少id/href/media-type的条目被忽略。
    pub fn parse_xml(xml_content: &str) -> Result<Opf> {
        Self::parse_events(xml_content).map_err(|e| match e {
            EpubError::XmlError(xml_err) => EpubError::OpfParseError(format!("XML解析错误: {}", xml_err)),
            other => other,
        })
    }

    fn parse_events(xml_content: &str) -> Result<Opf> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut version = String::new();
        let mut metadata = Metadata::new();
        let mut manifest: Vec<ManifestItem> = Vec::new();
        let mut spine = Spine::default();

        let mut section = Section::None;
        let mut pending: Option<PendingElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    let local_name = xml::local_name(e);
                    match (section, local_name.as_str()) {
                        (_, "package") => {
                            version = xml::attribute(e, "version")?.unwrap_or_default();
                        }
                        (_, "metadata") => section = Section::Metadata,
                        (_, "manifest") => section = Section::Manifest,
                        (_, "spine") => {
                            section = Section::Spine;
                            spine.toc = xml::attribute(e, "toc")?;
                        }
                        (Section::Metadata, _) => {
                            pending = Self::open_metadata_element(e, &mut metadata)?;
                        }
                        (Section::Manifest, "item") => Self::parse_manifest_item(e, &mut manifest)?,
                        (Section::Spine, "itemref") => Self::parse_spine_item(e, &mut spine)?,
                        _ => {}
                    }
                }
                Event::Empty(ref e) => {
                    let local_name = xml::local_name(e);
                    match (section, local_name.as_str()) {
                        (Section::Metadata, _) => {
                            // 空元素没有文本内容，只有name/content形式的meta才有意义
                            Self::open_metadata_element(e, &mut metadata)?;
                        }
                        (Section::Manifest, "item") => Self::parse_manifest_item(e, &mut manifest)?,
                        (Section::Spine, "itemref") => Self::parse_spine_item(e, &mut spine)?,
                        (_, "spine") => {
                            spine.toc = xml::attribute(e, "toc")?;
                        }
                        _ => {}
                    }
                }
                Event::Text(e) => {
                    if let Some(element) = pending.as_mut() {
                        element.text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if let Some(element) = pending.as_mut() {
                        element.text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::End(ref e) => {
                    let local_name_bytes = e.local_name();
                    match local_name_bytes.as_ref() {
                        b"metadata" | b"manifest" | b"spine" => section = Section::None,
                        _ => {
                            if let Some(element) = pending.take() {
                                let value = element.text.trim().to_string();
                                if !value.is_empty() {
                                    metadata.add(element.namespace, element.name, value, element.attributes);
                                }
                            }
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Opf {
            version,
            metadata,
            manifest,
            spine,
        })
    }

    /// 处理元数据区域中的元素开始标签
    ///
    /// `<meta name=".." content=".."/>` 直接写入；其余元素返回待收集文本的状态。
    fn open_metadata_element(e: &BytesStart, metadata: &mut Metadata) -> Result<Option<PendingElement>> {
        let local_name = xml::local_name(e);
        let attributes: HashMap<String, String> = xml::attributes(e)?.into_iter().collect();

        if local_name == "meta" {
            if let (Some(name), Some(content)) = (attributes.get("name"), attributes.get("content")) {
                metadata.add(Namespace::Opf, name.clone(), content.clone(), attributes.clone());
                return Ok(None);
            }
            return Ok(attributes.get("property").cloned().map(|property| PendingElement {
                namespace: Namespace::Opf,
                name: property,
                attributes,
                text: String::new(),
            }));
        }

        let namespace = match xml::prefix(e) {
            None => Namespace::DublinCore,
            Some(prefix) if prefix == "dc" => Namespace::DublinCore,
            Some(prefix) => Namespace::Other(prefix),
        };
        Ok(Some(PendingElement {
            namespace,
            name: local_name,
            attributes,
            text: String::new(),
        }))
    }

    /// 解析清单项
    fn parse_manifest_item(e: &BytesStart, manifest: &mut Vec<ManifestItem>) -> Result<()> {
        let mut item = ManifestItem::new(String::new(), String::new(), String::new());

        for (key, value) in xml::attributes(e)? {
            match key.as_str() {
                "id" => item.id = value,
                "href" => item.href = value,
                "media-type" => item.media_type = value,
                "properties" => item.properties = Some(value),
                _ => {}
            }
        }

        if item.id.is_empty() || item.href.is_empty() || item.media_type.is_empty() {
            return Ok(());
        }
        if manifest.iter().any(|existing| existing.id == item.id) {
            tracing::warn!(id = %item.id, "清单中存在重复ID，忽略后出现的条目");
            return Ok(());
        }
        manifest.push(item);
        Ok(())
    }

    /// 解析脊柱项
    fn parse_spine_item(e: &BytesStart, spine: &mut Spine) -> Result<()> {
        let mut spine_item = SpineItem::new(String::new());

        for (key, value) in xml::attributes(e)? {
            match key.as_str() {
                "idref" => spine_item.idref = value,
                "linear" => spine_item.linear = value != "no",
                _ => {}
            }
        }

        if !spine_item.idref.is_empty() {
            spine.items.push(spine_item);
        }
        Ok(())
    }

    /// 根据ID获取清单项
    pub fn manifest_item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// NCX清单项：优先使用 `<spine toc>` 引用，其次按媒体类型查找
    pub fn ncx_item(&self) -> Option<&ManifestItem> {
        self.spine
            .toc
            .as_deref()
            .and_then(|id| self.manifest_item(id))
            .filter(|item| item.kind() == ItemKind::Navigation)
            .or_else(|| self.manifest.iter().find(|item| item.kind() == ItemKind::Navigation))
    }

    /// EPUB3导航文档清单项
    pub fn nav_item(&self) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.is_nav())
    }
}
