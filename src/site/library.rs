//! 批量转换
//!
//! 扫描输入目录中的EPUB文件，逐本转换并收集书架记录。单本书的失败只报告，
//! 不会中断批处理；输出比源文件新的书籍直接跳过，但仍然出现在书架上。

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::epub::archive::Archive;
use crate::epub::error::{EpubError, Result};
use crate::fsutil;
use crate::site::emitter::SiteEmitter;
use crate::site::{encode_segment, INDEX_FILE};

/// 书架上的一本书
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub title: String,
    /// 书籍输出目录名（EPUB文件名去掉扩展名）
    pub dir_name: String,
}

impl BookRecord {
    pub fn new(title: impl Into<String>, dir_name: impl Into<String>) -> Self {
        BookRecord {
            title: title.into(),
            dir_name: dir_name.into(),
        }
    }

    /// 相对于书架页面的链接
    pub fn href(&self) -> String {
        format!("{}/{}", encode_segment(&self.dir_name), INDEX_FILE)
    }
}

/// 批处理进度
#[derive(Debug)]
pub enum BatchEvent<'a> {
    Processing { index: usize, total: usize, name: &'a str },
    Skipped { index: usize, total: usize, name: &'a str },
    Converted { index: usize, total: usize, name: &'a str, title: &'a str },
    Failed { index: usize, total: usize, name: &'a str, error: &'a EpubError },
}

/// 一次批处理的结果
#[derive(Debug, Default)]
pub struct LibraryReport {
    /// 发现的EPUB文件数
    pub discovered: usize,
    pub converted: usize,
    pub skipped: usize,
    /// 失败的文件及错误信息
    pub failed: Vec<(PathBuf, String)>,
    /// 书架记录，保持处理顺序
    pub books: Vec<BookRecord>,
    /// 书架页面路径，没有发现任何文件时为 `None`
    pub shelf: Option<PathBuf>,
}

/// 列出目录中（不含子目录）的EPUB文件，按路径排序
pub fn discover(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| EpubError::Io(e.into()))?;
        let is_epub = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"));
        if entry.file_type().is_file() && is_epub {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// 输出的 `index.html` 比EPUB文件新时视为已是最新
pub fn is_up_to_date(archive_path: &Path, index_path: &Path) -> bool {
    let modified = |path: &Path| fs::metadata(path).and_then(|meta| meta.modified()).ok();
    match (modified(archive_path), modified(index_path)) {
        (Some(source), Some(output)) => output > source,
        _ => false,
    }
}

/// 尽量读取书名，失败时使用文件名
pub fn read_title(archive_path: &Path) -> String {
    Archive::open(archive_path)
        .ok()
        .and_then(|archive| archive.title().map(str::to_string))
        .unwrap_or_else(|| file_stem(archive_path))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 转换一本书，返回书名
pub fn convert_book(archive_path: &Path, book_root: &Path, emitter: &SiteEmitter) -> Result<String> {
    let archive = Archive::open(archive_path)?;
    let title = match archive.title() {
        Some(title) => title.to_string(),
        None => {
            let missing = EpubError::MetadataMissing("dc:title".to_string());
            tracing::warn!(path = %archive_path.display(), error = %missing, "使用文件名作为书名");
            file_stem(archive_path)
        }
    };
    emitter.emit_book(&archive, &title, book_root)?;
    Ok(title)
}

/// 转换整个目录并生成书架
///
/// # 参数
/// * `input_dir` - 存放EPUB文件的目录
/// * `output_dir` - 站点输出目录
/// * `force` - 忽略已是最新的判断
/// * `on_event` - 进度回调
pub fn convert_library<F>(
    input_dir: &Path,
    output_dir: &Path,
    emitter: &SiteEmitter,
    force: bool,
    mut on_event: F,
) -> Result<LibraryReport>
where
    F: FnMut(BatchEvent),
{
    let files = discover(input_dir)?;
    let mut report = LibraryReport {
        discovered: files.len(),
        ..LibraryReport::default()
    };
    if files.is_empty() {
        return Ok(report);
    }
    fsutil::ensure_dir(output_dir)?;

    let total = files.len();
    for (position, path) in files.iter().enumerate() {
        let index = position + 1;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir_name = file_stem(path);
        let book_root = output_dir.join(&dir_name);

        if !force && is_up_to_date(path, &book_root.join(INDEX_FILE)) {
            on_event(BatchEvent::Skipped { index, total, name: &name });
            tracing::debug!(path = %path.display(), "输出已是最新，跳过");
            report.skipped += 1;
            report.books.push(BookRecord::new(read_title(path), dir_name));
            continue;
        }

        on_event(BatchEvent::Processing { index, total, name: &name });
        match convert_book(path, &book_root, emitter) {
            Ok(title) => {
                on_event(BatchEvent::Converted { index, total, name: &name, title: &title });
                report.converted += 1;
                report.books.push(BookRecord::new(title, dir_name));
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), kind = ?error.kind(), error = %error, "转换失败");
                on_event(BatchEvent::Failed { index, total, name: &name, error: &error });
                report.failed.push((path.clone(), error.to_string()));
            }
        }
    }

    report.shelf = Some(emitter.emit_bookshelf(output_dir, &report.books)?);
    Ok(report)
}
