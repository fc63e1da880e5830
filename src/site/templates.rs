//! 页面模板
//!
//! 内置模板编译进二进制文件；配置了模板目录时，目录中存在的文件覆盖对应的内置模板。
//! 占位符形如 `{title}`，只替换已知的键，CSS中的花括号原样保留。

use std::fs;
use std::path::Path;

use crate::epub::error::{EpubError, Result};

const CHAPTER_LAYOUT: &str = include_str!("../../templates/layout_chapter.html");
const TOC_LAYOUT: &str = include_str!("../../templates/layout_toc.html");
const SHELF_LAYOUT: &str = include_str!("../../templates/layout_shelf.html");
const CHAPTER_STYLE: &str = include_str!("../../templates/chapter.css");

/// 一次转换使用的模板集合
#[derive(Debug, Clone)]
pub struct Templates {
    chapter: String,
    toc: String,
    shelf: String,
    style: String,
}

impl Default for Templates {
    fn default() -> Self {
        Templates {
            chapter: CHAPTER_LAYOUT.to_string(),
            toc: TOC_LAYOUT.to_string(),
            shelf: SHELF_LAYOUT.to_string(),
            style: CHAPTER_STYLE.to_string(),
        }
    }
}

impl Templates {
    /// 加载模板，`root` 中缺少的文件使用内置版本
    pub fn load(root: Option<&Path>) -> Result<Self> {
        let Some(root) = root else {
            return Ok(Templates::default());
        };
        if !root.is_dir() {
            return Err(EpubError::ConfigError(format!("模板目录不存在: {}", root.display())));
        }
        Ok(Templates {
            chapter: read_or(root, "layout_chapter.html", CHAPTER_LAYOUT)?,
            toc: read_or(root, "layout_toc.html", TOC_LAYOUT)?,
            shelf: read_or(root, "layout_shelf.html", SHELF_LAYOUT)?,
            style: read_or(root, "chapter.css", CHAPTER_STYLE)?,
        })
    }

    /// 章节页面；参数都应是已转义的HTML
    pub fn render_chapter(&self, title: &str, content: &str, nav: &str) -> String {
        render(
            &self.chapter,
            &[("title", title), ("content", content), ("nav", nav), ("style", self.style.as_str())],
        )
    }

    /// 书籍目录页面
    pub fn render_toc(&self, title: &str, toc_content: &str, back_label: &str) -> String {
        render(
            &self.toc,
            &[("title", title), ("toc_content", toc_content), ("back", back_label)],
        )
    }

    /// 书架页面
    pub fn render_shelf(&self, title: &str, content: &str) -> String {
        render(&self.shelf, &[("title", title), ("content", content)])
    }

    /// 章节样式表
    pub fn style(&self) -> &str {
        &self.style
    }
}

fn read_or(root: &Path, name: &str, builtin: &str) -> Result<String> {
    let path = root.join(name);
    if !path.is_file() {
        return Ok(builtin.to_string());
    }
    tracing::debug!(path = %path.display(), "使用自定义模板");
    fs::read_to_string(&path).map_err(|e| EpubError::ConfigError(format!("无法读取模板 {}: {}", path.display(), e)))
}

/// 一次扫描完成占位符替换，替换进来的内容不会再被解释
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replacement = after.find('}').and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });
        match replacement {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
