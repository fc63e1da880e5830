//! 脊柱模块
//!
//! 提供EPUB包中阅读顺序（脊柱）的结构定义。

/// 脊柱项信息(阅读顺序)
#[derive(Debug, Clone)]
pub struct SpineItem {
    /// 引用的清单项ID
    pub idref: String,
    /// 是否线性阅读
    pub linear: bool,
}

impl SpineItem {
    /// 创建新的脊柱项
    pub fn new(idref: String) -> Self {
        Self { idref, linear: true }
    }
}

/// 完整的脊柱信息
#[derive(Debug, Clone, Default)]
pub struct Spine {
    /// NCX清单项的ID（`<spine toc="...">`）
    pub toc: Option<String>,
    /// 阅读顺序
    pub items: Vec<SpineItem>,
}

impl Spine {
    /// 按阅读顺序返回被引用的清单项ID
    pub fn idrefs(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.idref.as_str())
    }
}
