//! EPUB瘦身
//!
//! 删除图片、字体、音视频等二进制资源，清理内容文档中的媒体元素，去掉样式表中的
//! `@font-face` 规则，然后重新打包。每个条目的处理结果都是显式的 `Result`，
//! 失败时按 [`TransformPolicy`] 决定跳过、保留原内容或放弃整本书。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::epub::archive::{Archive, Item};
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::ItemKind;
use crate::fsutil;
use crate::html::{sanitize, SanitizeOptions};
use crate::site::library::discover;

/// 只匹配到第一个右花括号，不支持嵌套的花括号
static FONT_FACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@font-face\s*\{[^}]*\}").expect("@font-face 正则表达式无效"));

/// 删除样式表中的 `@font-face { ... }` 块
pub fn strip_font_faces(css: &str) -> String {
    FONT_FACE.replace_all(css, "").into_owned()
}

/// 单个条目处理失败时的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformPolicy {
    /// 从新文件中删除该条目
    Skip,
    /// 保留原内容
    #[default]
    LeaveOriginal,
    /// 放弃整本书
    Abort,
}

/// 条目处理失败
#[derive(Error, Debug, Clone)]
#[error("无法处理 {path}: {reason}")]
pub struct TransformError {
    pub path: String,
    pub reason: String,
}

/// 瘦身选项
#[derive(Debug, Clone)]
pub struct SlimOptions {
    /// 整体删除的条目类别
    pub excluded: Vec<ItemKind>,
    pub policy: TransformPolicy,
    /// 样式表的转换函数
    pub style_transform: fn(&str) -> String,
}

impl Default for SlimOptions {
    fn default() -> Self {
        SlimOptions {
            excluded: ItemKind::binary_assets().to_vec(),
            policy: TransformPolicy::default(),
            style_transform: strip_font_faces,
        }
    }
}

/// 瘦身统计
#[derive(Debug, Default)]
pub struct SlimReport {
    /// 被删除条目的路径
    pub removed: Vec<String>,
    /// 处理失败的条目
    pub failures: Vec<TransformError>,
}

/// 处理单个条目
pub fn transform_item(item: &Item, options: &SlimOptions) -> std::result::Result<Item, TransformError> {
    let fail = |reason: String| TransformError {
        path: item.path.clone(),
        reason,
    };
    match item.kind {
        ItemKind::Document => {
            let sanitized = sanitize(&item.content, &SanitizeOptions::slim()).map_err(|e| fail(e.to_string()))?;
            Ok(item.clone().with_content(sanitized.markup.into_bytes()))
        }
        ItemKind::Style => {
            let css = std::str::from_utf8(&item.content).map_err(|e| fail(format!("样式表不是UTF-8: {}", e)))?;
            Ok(item.clone().with_content((options.style_transform)(css).into_bytes()))
        }
        _ => Ok(item.clone()),
    }
}

/// 生成瘦身后的快照
pub fn slim(archive: &Archive, options: &SlimOptions) -> Result<(Archive, SlimReport)> {
    let mut report = SlimReport::default();
    let mut items = Vec::with_capacity(archive.items().len());

    for item in archive.items() {
        if options.excluded.contains(&item.kind) {
            report.removed.push(item.path.clone());
            continue;
        }
        match transform_item(item, options) {
            Ok(transformed) => items.push(transformed),
            Err(error) => {
                tracing::warn!(path = %error.path, reason = %error.reason, policy = ?options.policy, "条目处理失败");
                match options.policy {
                    TransformPolicy::Skip => report.removed.push(item.path.clone()),
                    TransformPolicy::LeaveOriginal => items.push(item.clone()),
                    TransformPolicy::Abort => return Err(EpubError::UnparsableDocument(error.to_string())),
                }
                report.failures.push(error);
            }
        }
    }

    Ok((archive.with_items(items), report))
}

/// 瘦身并序列化为新的EPUB字节
pub fn rebuild(archive: &Archive, options: &SlimOptions) -> Result<Vec<u8>> {
    let (slimmed, report) = slim(archive, options)?;
    tracing::debug!(removed = report.removed.len(), failures = report.failures.len(), "瘦身完成");
    slimmed.to_bytes()
}

/// 一个待处理的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlimJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// 处理前后的文件大小（字节）
#[derive(Debug, Clone, Copy)]
pub struct SlimOutcome {
    pub before: u64,
    pub after: u64,
}

fn has_epub_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"))
}

/// 根据输入输出路径规划任务
///
/// - 输入是文件：输出以 `.epub` 结尾时视为目标文件，否则视为目录
/// - 输入是目录：其中每个EPUB以原文件名写入输出目录
/// - 没有输出路径时原地替换
pub fn plan(input: &Path, output: Option<&Path>) -> Result<Vec<SlimJob>> {
    if input.is_file() {
        let target = match output {
            None => input.to_path_buf(),
            Some(output) if has_epub_extension(output) => output.to_path_buf(),
            Some(output) => output.join(input.file_name().unwrap_or(input.as_os_str())),
        };
        return Ok(vec![SlimJob {
            input: input.to_path_buf(),
            output: target,
        }]);
    }
    if input.is_dir() {
        return Ok(discover(input)?
            .into_iter()
            .map(|path| {
                let output = match (output, path.file_name()) {
                    (Some(dir), Some(name)) => dir.join(name),
                    _ => path.clone(),
                };
                SlimJob { input: path, output }
            })
            .collect());
    }
    Err(EpubError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("输入路径不存在: {}", input.display()),
    )))
}

/// 处理一个文件，输出通过临时文件原子替换
pub fn slim_file(job: &SlimJob, options: &SlimOptions) -> Result<SlimOutcome> {
    let before = fs::metadata(&job.input)?.len();
    let bytes = {
        let archive = Archive::open(&job.input)?;
        rebuild(&archive, options)?
    };
    fsutil::write_atomic(&job.output, &bytes)?;
    Ok(SlimOutcome {
        before,
        after: bytes.len() as u64,
    })
}
