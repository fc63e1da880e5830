//! 元数据处理模块
//!
//! 按文档顺序保存OPF `<metadata>` 中的条目，并提供按命名空间和键查询的接口。

use std::collections::HashMap;

/// Dublin Core命名空间URI
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";
/// OPF命名空间URI
pub const OPF_NAMESPACE: &str = "http://www.idpf.org/2007/opf";

/// 元数据条目所属的命名空间
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Namespace {
    /// `dc:*` 元素
    DublinCore,
    /// `<meta>` 元素
    Opf,
    /// 其他前缀的元素，保存前缀本身
    Other(String),
}

impl Namespace {
    /// 解析调用方给出的命名空间名称
    ///
    /// 接受简写（`DC`、`OPF`，大小写不敏感）或完整的命名空间URI。
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("dc") || name == DC_NAMESPACE {
            Namespace::DublinCore
        } else if name.eq_ignore_ascii_case("opf") || name == OPF_NAMESPACE {
            Namespace::Opf
        } else {
            Namespace::Other(name.to_string())
        }
    }
}

/// 单条元数据
#[derive(Debug, Clone)]
pub struct MetadataEntry {
    /// 命名空间
    pub namespace: Namespace,
    /// 键（元素本地名称，或meta的name/property）
    pub name: String,
    /// 值
    pub value: String,
    /// 元素上的其他属性
    pub attributes: HashMap<String, String>,
}

/// OPF文件中的元数据信息
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entries: Vec<MetadataEntry>,
}

impl Metadata {
    /// 创建新的元数据实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条元数据
    pub fn add(&mut self, namespace: Namespace, name: String, value: String, attributes: HashMap<String, String>) {
        self.entries.push(MetadataEntry {
            namespace,
            name,
            value,
            attributes,
        });
    }

    /// 按命名空间与键查询，保持文档顺序；不存在时返回空列表
    pub fn values(&self, namespace: &str, key: &str) -> Vec<&str> {
        let namespace = Namespace::parse(namespace);
        self.entries
            .iter()
            .filter(|entry| entry.namespace == namespace && entry.name == key)
            .map(|entry| entry.value.as_str())
            .collect()
    }

    /// 第一个非空的 `dc:title`
    pub fn title(&self) -> Option<&str> {
        self.values("DC", "title")
            .into_iter()
            .map(str::trim)
            .find(|title| !title.is_empty())
    }

    /// 全部条目
    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
