//! 站点配置模块
//!
//! 提供静态站点生成的配置管理功能，支持从YAML文件加载配置。
//! 所有字段在文件中都是可选的，缺省时使用默认值。

use crate::epub::error::{EpubError, Result};
use crate::fsutil;
use crate::site::order::NamingStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "bookshelf.yaml";

/// 章节页面的生成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PageMode {
    /// 清理后的正文嵌入章节模板
    Template,
    /// 保留完整文档，在其中注入样式和导航
    Standalone,
}

/// 书架上书籍的排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelfOrder {
    /// 按书名
    Title,
    /// 按EPUB文件名
    Filename,
}

/// 导航链接上的文字
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub prev: String,
    pub contents: String,
    pub bookshelf: String,
    pub next: String,
    /// 目录页返回书架的链接
    pub back: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            prev: "Prev".to_string(),
            contents: "Contents".to_string(),
            bookshelf: "Bookshelf".to_string(),
            next: "Next".to_string(),
            back: "Back to Bookshelf".to_string(),
        }
    }
}

/// 一次转换运行的配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// 书架页面标题
    pub library_title: String,
    /// 章节输出文件的命名方式
    pub naming: NamingStrategy,
    /// 章节页面的生成方式
    pub page_mode: PageMode,
    /// 同时删除style、link和script元素
    pub strict: bool,
    /// 保留的属性，空列表表示全部保留
    pub allowed_attributes: Vec<String>,
    /// 自定义模板目录，缺少的文件使用内置模板
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_root: Option<PathBuf>,
    /// 书架排序方式
    pub shelf_order: ShelfOrder,
    /// 导航文字
    pub labels: Labels,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            library_title: "My Bookshelf".to_string(),
            naming: NamingStrategy::Renumber,
            page_mode: PageMode::Template,
            strict: true,
            allowed_attributes: vec!["href".to_string(), "id".to_string()],
            template_root: None,
            shelf_order: ShelfOrder::Title,
            labels: Labels::default(),
        }
    }
}

impl SiteConfig {
    /// 独立页面预设：保留原文件名，在原文档中注入导航，不过滤属性
    pub fn standalone() -> Self {
        SiteConfig {
            naming: NamingStrategy::PreserveOriginal,
            page_mode: PageMode::Standalone,
            allowed_attributes: Vec::new(),
            ..SiteConfig::default()
        }
    }

    /// 从YAML文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| EpubError::ConfigError(format!("无法读取配置文件 {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// 解析YAML文本
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(SiteConfig::default());
        }
        serde_yml::from_str(content).map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))
    }

    /// 生成默认配置文件
    ///
    /// # 参数
    /// * `path` - 输出路径，`None` 时写入当前目录下的 `bookshelf.yaml`
    pub fn generate_default_config(path: Option<&Path>) -> Result<PathBuf> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let yaml_content = serde_yml::to_string(&SiteConfig::default())
            .map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))?;

        let content_with_header = format!(
            "# 书架站点配置文件\n# naming: renumber | preserve\n# page_mode: template | standalone\n# shelf_order: title | filename\n# allowed_attributes 为空时保留全部属性\n\n{}",
            yaml_content
        );
        fsutil::write_atomic(&path, content_with_header.as_bytes())?;
        Ok(path)
    }

    /// 属性白名单，空列表返回 `None`
    pub fn attribute_filter(&self) -> Option<&[String]> {
        if self.allowed_attributes.is_empty() {
            None
        } else {
            Some(&self.allowed_attributes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.library_title, "My Bookshelf");
        assert_eq!(config.naming, NamingStrategy::Renumber);
        assert_eq!(config.page_mode, PageMode::Template);
        assert!(config.strict);
        assert_eq!(config.attribute_filter(), Some(&["href".to_string(), "id".to_string()][..]));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = SiteConfig::from_yaml(
            "library_title: 我的书架\nnaming: preserve\nlabels:\n  prev: 上一章\n",
        )
        .unwrap();
        assert_eq!(config.library_title, "我的书架");
        assert_eq!(config.naming, NamingStrategy::PreserveOriginal);
        assert_eq!(config.labels.prev, "上一章");
        assert_eq!(config.labels.next, "Next");
        assert_eq!(config.shelf_order, ShelfOrder::Title);
    }

    #[test]
    fn test_empty_attribute_list_keeps_everything() {
        let config = SiteConfig::from_yaml("allowed_attributes: []").unwrap();
        assert!(config.attribute_filter().is_none());
        assert!(SiteConfig::standalone().attribute_filter().is_none());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = SiteConfig::from_yaml("naming: sideways");
        assert!(matches!(result, Err(EpubError::ConfigError(_))));
    }

    #[test]
    fn test_generate_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = SiteConfig::generate_default_config(Some(&dir.path().join("site.yaml"))).unwrap();
        let config = SiteConfig::from_file(&path).unwrap();
        assert_eq!(config, SiteConfig::default());
    }
}
