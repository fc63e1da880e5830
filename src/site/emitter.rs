//! 站点生成
//!
//! 把一本书写成 `chapters/` 下的章节页面加上书籍目录 `index.html`，以及书架页面。
//! 书籍的 `index.html` 最后写入，中途失败的转换不会被当作已是最新。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use maud::{html, Markup};

use crate::epub::archive::{Archive, Item};
use crate::epub::error::Result;
use crate::fsutil;
use crate::html::{sanitize, SanitizeOptions};
use crate::site::config::{PageMode, ShelfOrder, SiteConfig};
use crate::site::library::BookRecord;
use crate::site::order::{natural_cmp, OrderedDocument, ReadingOrder};
use crate::site::resolve::{resolve, TocEntry};
use crate::site::templates::Templates;
use crate::site::{encode_segment, escape, CHAPTERS_DIR, INDEX_FILE};

/// 一次转换运行的页面生成器
#[derive(Debug, Clone)]
pub struct SiteEmitter {
    config: SiteConfig,
    templates: Templates,
}

impl SiteEmitter {
    /// 创建生成器并加载模板
    pub fn new(config: SiteConfig) -> Result<Self> {
        let templates = Templates::load(config.template_root.as_deref())?;
        Ok(SiteEmitter { config, templates })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// 生成一本书，返回书籍目录
    ///
    /// # 参数
    /// * `archive` - 已打开的EPUB
    /// * `title` - 书名，也是没有目录标题的章节的页面标题
    /// * `book_root` - 输出目录
    pub fn emit_book(&self, archive: &Archive, title: &str, book_root: &Path) -> Result<PathBuf> {
        // 所有文档排好序后才能确定文件名和相邻关系
        let order = ReadingOrder::new(archive.documents(), self.config.naming);
        let resolution = resolve(archive.toc(), archive);
        // 章节之间的链接指向输出文件名
        let links: HashMap<String, String> = order
            .documents()
            .iter()
            .map(|document| (document.source_name.clone(), encode_segment(&document.output_name)))
            .collect();

        let chapters_dir = book_root.join(CHAPTERS_DIR);
        fsutil::ensure_dir(&chapters_dir)?;

        for document in order.documents() {
            let page_title = resolution
                .titles
                .get(&document.source_name)
                .map(String::as_str)
                .unwrap_or(title);
            let page = self.chapter_page(document, page_title, &links);
            fsutil::write_atomic(chapters_dir.join(&document.output_name), page.as_bytes())?;
            tracing::debug!(source = %document.source_name, output = %document.output_name, "章节已生成");
        }

        let toc_content = toc_list(&resolution.entries, &order, 0).into_string();
        let index = self
            .templates
            .render_toc(&escape(title), &toc_content, &escape(&self.config.labels.back));
        fsutil::write_atomic(book_root.join(INDEX_FILE), index.as_bytes())?;

        tracing::info!(title = %title, chapters = order.len(), root = %book_root.display(), "书籍已生成");
        Ok(book_root.to_path_buf())
    }

    /// 生成书架页面，返回其路径
    pub fn emit_bookshelf(&self, library_root: &Path, books: &[BookRecord]) -> Result<PathBuf> {
        let mut books: Vec<&BookRecord> = books.iter().collect();
        match self.config.shelf_order {
            ShelfOrder::Title => books.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.dir_name.cmp(&b.dir_name))),
            ShelfOrder::Filename => books.sort_by(|a, b| natural_cmp(&a.dir_name, &b.dir_name)),
        }

        let items = html! {
            @for book in &books {
                li.book {
                    a href=(book.href()) { span { (book.title) } }
                }
            }
        };
        let page = self
            .templates
            .render_shelf(&escape(&self.config.library_title), &items.into_string());

        let path = library_root.join(INDEX_FILE);
        fsutil::write_atomic(&path, page.as_bytes())?;
        Ok(path)
    }

    /// 生成单个章节页面，清理失败时保留原内容
    fn chapter_page(&self, document: &OrderedDocument, page_title: &str, links: &HashMap<String, String>) -> String {
        let nav = self.navigation(document).into_string();
        let mut options = SanitizeOptions::chapter(self.config.strict)
            .title(page_title)
            .link_targets(links.clone());
        if let Some(allowed) = self.config.attribute_filter() {
            options = options.allowed_attrs(allowed.iter().cloned());
        }

        match self.config.page_mode {
            PageMode::Template => {
                let body = match sanitize(&document.item.content, &options) {
                    Ok(sanitized) => sanitized.body,
                    Err(e) => {
                        warn_unsanitized(document.item, &e);
                        String::from_utf8_lossy(&document.item.content).into_owned()
                    }
                };
                self.templates.render_chapter(&escape(page_title), &body, &nav)
            }
            PageMode::Standalone => {
                let options = options
                    .head_extra(format!("<style>{}</style>", self.templates.style()))
                    .body_extra(nav);
                match sanitize(&document.item.content, &options) {
                    Ok(sanitized) => sanitized.markup,
                    Err(e) => {
                        warn_unsanitized(document.item, &e);
                        String::from_utf8_lossy(&document.item.content).into_owned()
                    }
                }
            }
        }
    }

    /// 上一章/目录/书架/下一章导航，没有相邻章节时显示为不可用
    fn navigation(&self, document: &OrderedDocument) -> Markup {
        let labels = &self.config.labels;
        html! {
            nav.chapter-navigation {
                (neighbor(document.prev.as_deref(), &labels.prev))
                a href="../index.html" { (labels.contents) }
                a href="../../index.html" { (labels.bookshelf) }
                (neighbor(document.next.as_deref(), &labels.next))
            }
        }
    }
}

fn warn_unsanitized(item: &Item, error: &crate::epub::EpubError) {
    tracing::warn!(path = %item.path, error = %error, "文档清理失败，保留原内容");
}

fn neighbor(target: Option<&str>, label: &str) -> Markup {
    html! {
        @if let Some(target) = target {
            a href=(encode_segment(target)) { (label) }
        } @else {
            span.disabled { (label) }
        }
    }
}

/// 条目本身有链接，或者有可显示的子条目
fn is_visible(entry: &TocEntry) -> bool {
    entry.target.is_some() || entry.children.iter().any(is_visible)
}

fn toc_href(entry: &TocEntry, order: &ReadingOrder) -> Option<String> {
    let output = order.output_name(entry.target.as_deref()?)?;
    let mut href = format!("{}/{}", CHAPTERS_DIR, encode_segment(output));
    if let Some(fragment) = &entry.fragment {
        href.push('#');
        href.push_str(fragment);
    }
    Some(href)
}

/// 嵌套目录列表，子列表带 `nested-list` 类
fn toc_list(entries: &[TocEntry], order: &ReadingOrder, depth: usize) -> Markup {
    html! {
        ul class=[(depth > 0).then_some("nested-list")] {
            @for entry in entries.iter().filter(|entry| is_visible(entry)) {
                li {
                    @if let Some(href) = toc_href(entry, order) {
                        a href=(href) { (entry.title) }
                    } @else {
                        span.toc-heading { (entry.title) }
                    }
                    @if entry.children.iter().any(is_visible) {
                        (toc_list(&entry.children, order, depth + 1))
                    }
                }
            }
        }
    }
}
