//! 已打开EPUB的内存快照
//!
//! `Archive` 一次性读入容器中的全部内容后即释放文件句柄。转换流程只读取它，
//! 瘦身流程通过 [`Archive::with_items`] 生成新的快照，而不是原地修改。

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::epub::error::{EpubError, Result};
use crate::epub::nav;
use crate::epub::ncx::Ncx;
use crate::epub::opf::{ItemKind, ManifestItem, Opf};
use crate::epub::path;
use crate::epub::reader::Epub;
use crate::epub::toc::TocNode;

/// 清单中的一个条目及其内容
#[derive(Debug, Clone)]
pub struct Item {
    pub id: String,
    /// 清单中原始的href
    pub href: String,
    /// 相对于压缩包根目录、已解码的完整路径
    pub path: String,
    pub media_type: String,
    pub kind: ItemKind,
    pub properties: Option<String>,
    pub content: Vec<u8>,
}

impl Item {
    fn from_manifest(manifest_item: &ManifestItem, path: String, content: Vec<u8>) -> Self {
        Item {
            id: manifest_item.id.clone(),
            href: manifest_item.href.clone(),
            path,
            media_type: manifest_item.media_type.clone(),
            kind: manifest_item.kind(),
            properties: manifest_item.properties.clone(),
            content,
        }
    }

    /// 文件名部分，用作文档的标识
    pub fn basename(&self) -> &str {
        path::basename(&self.path)
    }

    pub fn is_document(&self) -> bool {
        self.kind == ItemKind::Document
    }

    /// 替换内容，保持标识不变
    pub fn with_content(self, content: Vec<u8>) -> Self {
        Item { content, ..self }
    }
}

/// 不在清单中的压缩包条目（mimetype、container.xml、OPF等）
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub data: Vec<u8>,
}

/// 已打开的EPUB
#[derive(Debug, Clone)]
pub struct Archive {
    opf_path: String,
    opf: Opf,
    items: Vec<Item>,
    resources: Vec<Resource>,
    toc: Vec<TocNode>,
}

impl Archive {
    /// 打开EPUB文件
    ///
    /// 任何读取或结构错误都包装为 [`EpubError::ArchiveRead`]。
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Archive> {
        let path = path.as_ref();
        File::open(path)
            .map_err(EpubError::from)
            .and_then(Self::from_reader)
            .map_err(|e| EpubError::archive_read(path, e))
    }

    /// 从内存中的字节创建
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Archive> {
        Self::from_reader(std::io::Cursor::new(bytes))
    }

    /// 读取全部内容，返回时数据源已被释放
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Archive> {
        let mut epub = Epub::from_reader(reader)?;
        let opf_path = epub.opf_path()?;
        let opf_content = epub
            .read_string(&opf_path)?
            .ok_or_else(|| EpubError::OpfParseError(format!("OPF文件不存在: {}", opf_path)))?;
        let opf = Opf::parse_xml(&opf_content)?;

        let mut items = Vec::with_capacity(opf.manifest.len());
        for manifest_item in &opf.manifest {
            let item_path = path::resolve_href(&opf_path, &manifest_item.href);
            match epub.read_bytes(&item_path)? {
                Some(content) => items.push(Item::from_manifest(manifest_item, item_path, content)),
                None => {
                    tracing::warn!(id = %manifest_item.id, path = %item_path, "清单中的文件不存在，已忽略");
                }
            }
        }

        let item_paths: HashSet<&str> = items.iter().map(|item| item.path.as_str()).collect();
        let mut resources = Vec::new();
        for name in epub.entries_in_order()? {
            if item_paths.contains(name.as_str()) {
                continue;
            }
            if let Some(data) = epub.read_bytes(&name)? {
                resources.push(Resource { name, data });
            }
        }

        let mut archive = Archive {
            opf_path,
            opf,
            items,
            resources,
            toc: Vec::new(),
        };
        archive.toc = archive.load_toc();
        Ok(archive)
    }

    /// 按NCX、导航文档、阅读顺序的优先级构建目录
    fn load_toc(&self) -> Vec<TocNode> {
        if let Some(ncx_item) = self.opf.ncx_item().and_then(|entry| self.item_by_id(&entry.id)) {
            let content = String::from_utf8_lossy(&ncx_item.content);
            match Ncx::parse_xml(&content, &ncx_item.path) {
                Ok(ncx) if !ncx.nav_map.is_empty() => return ncx.nav_map,
                Ok(_) => tracing::debug!(path = %ncx_item.path, "NCX目录为空"),
                Err(e) => tracing::warn!(path = %ncx_item.path, error = %e, "NCX解析失败"),
            }
        }

        if let Some(nav_item) = self.opf.nav_item().and_then(|entry| self.item_by_id(&entry.id)) {
            match nav::parse(&nav_item.content, &nav_item.path) {
                Ok(toc) if !toc.is_empty() => return toc,
                Ok(_) => tracing::debug!(path = %nav_item.path, "导航文档目录为空"),
                Err(e) => tracing::warn!(path = %nav_item.path, error = %e, "导航文档解析失败"),
            }
        }

        let missing = EpubError::MetadataMissing("目录".to_string());
        tracing::warn!(error = %missing, "使用阅读顺序生成目录");
        self.spine_documents()
            .map(|item| TocNode::new(path::file_stem(&item.path), item.path.clone(), Vec::new()))
            .collect()
    }

    /// OPF文件路径
    pub fn opf_path(&self) -> &str {
        &self.opf_path
    }

    /// 解析后的OPF
    pub fn opf(&self) -> &Opf {
        &self.opf
    }

    /// 全部条目，保持清单顺序
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// 非清单条目，保持压缩包顺序
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// 指定类别的条目，保持清单顺序
    pub fn items_of_type(&self, kind: ItemKind) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |item| item.kind == kind)
    }

    /// 全部内容文档
    pub fn documents(&self) -> impl Iterator<Item = &Item> {
        self.items_of_type(ItemKind::Document)
    }

    /// 按阅读顺序排列的内容文档
    pub fn spine_documents(&self) -> impl Iterator<Item = &Item> {
        self.opf
            .spine
            .idrefs()
            .filter_map(|idref| self.item_by_id(idref))
            .filter(|item| item.is_document())
    }

    /// 查询元数据，不存在时返回空列表
    ///
    /// # 参数
    /// * `namespace` - `DC`、`OPF` 或完整的命名空间URI
    /// * `key` - 元素名或meta名
    pub fn metadata(&self, namespace: &str, key: &str) -> Vec<&str> {
        self.opf.metadata.values(namespace, key)
    }

    /// 书名（第一个非空的 `dc:title`）
    pub fn title(&self) -> Option<&str> {
        self.opf.metadata.title()
    }

    /// 目录根节点
    pub fn toc(&self) -> &[TocNode] {
        &self.toc
    }

    pub fn item_by_id(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// 按完整路径查找条目
    pub fn item_by_path(&self, item_path: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.path == item_path)
    }

    /// 用新的条目集合生成快照，其余部分保持不变
    pub fn with_items(&self, items: Vec<Item>) -> Archive {
        Archive {
            opf_path: self.opf_path.clone(),
            opf: self.opf.clone(),
            items,
            resources: self.resources.clone(),
            toc: self.toc.clone(),
        }
    }
}
