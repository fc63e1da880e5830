//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义，以及按媒体类型划分的资源类别。

use serde::{Deserialize, Serialize};

/// 清单项的内容类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// XHTML/HTML内容文档（包括EPUB3导航文档）
    Document,
    /// CSS样式表
    Style,
    /// 图片
    Image,
    /// 字体
    Font,
    /// 音频
    Audio,
    /// 视频
    Video,
    /// NCX导航控制文件
    Navigation,
    /// 其他（脚本、SMIL等）
    Other,
}

impl ItemKind {
    /// 根据媒体类型判断类别
    pub fn from_media_type(media_type: &str) -> Self {
        let media_type = media_type.trim().to_ascii_lowercase();
        match media_type.as_str() {
            "application/xhtml+xml" | "text/html" | "application/html" => ItemKind::Document,
            "text/css" => ItemKind::Style,
            "application/x-dtbncx+xml" => ItemKind::Navigation,
            "application/vnd.ms-opentype"
            | "application/font-sfnt"
            | "application/x-font-ttf"
            | "application/x-font-truetype"
            | "application/x-font-otf"
            | "application/x-font-opentype" => ItemKind::Font,
            m if m.starts_with("application/font-") || m.starts_with("font/") => ItemKind::Font,
            m if m.starts_with("image/") => ItemKind::Image,
            m if m.starts_with("audio/") => ItemKind::Audio,
            m if m.starts_with("video/") => ItemKind::Video,
            _ => ItemKind::Other,
        }
    }

    /// 瘦身工具默认排除的二进制资源类别
    pub fn binary_assets() -> [ItemKind; 4] {
        [ItemKind::Image, ItemKind::Font, ItemKind::Audio, ItemKind::Video]
    }
}

/// 清单项信息
#[derive(Debug, Clone)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(相对于OPF文件，保持原样未解码)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
    /// 属性(如nav、cover-image等)
    pub properties: Option<String>,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new(id: String, href: String, media_type: String) -> Self {
        Self {
            id,
            href,
            media_type,
            properties: None,
        }
    }

    /// 检查是否包含指定属性
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|properties| properties.split_whitespace().any(|p| p == property))
    }

    /// 检查是否为导航文档
    pub fn is_nav(&self) -> bool {
        self.has_property("nav")
    }

    /// 内容类别
    pub fn kind(&self) -> ItemKind {
        ItemKind::from_media_type(&self.media_type)
    }
}
