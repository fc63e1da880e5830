//! 阅读顺序
//!
//! 按文件名自然排序内容文档（`chapter2` 排在 `chapter10` 之前），分配输出文件名，
//! 并计算每个文档的前后相邻文档。排序在分配文件名和相邻关系之前一次完成。

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::epub::archive::Item;

/// 输出文件的命名方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum NamingStrategy {
    /// 按排序结果编号：`1.html`、`2.html` ……
    #[serde(rename = "renumber")]
    #[value(name = "renumber")]
    Renumber,
    /// 保留原文件名
    #[serde(rename = "preserve")]
    #[value(name = "preserve")]
    PreserveOriginal,
}

/// 自然排序键的一段
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    /// 去掉前导零的数字串，避免大数溢出
    Number(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Number(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 自然排序键：交替的文本段与数字段，文本段不区分大小写
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Segment>);

impl NaturalKey {
    pub fn new(name: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut in_digits = false;

        for c in name.chars() {
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != in_digits {
                segments.push(Self::segment(std::mem::take(&mut current), in_digits));
            }
            in_digits = is_digit;
            current.push(c);
        }
        if !current.is_empty() {
            segments.push(Self::segment(current, in_digits));
        }
        NaturalKey(segments)
    }

    fn segment(run: String, digits: bool) -> Segment {
        if digits {
            let trimmed = run.trim_start_matches('0');
            Segment::Number(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() })
        } else {
            Segment::Text(run.to_lowercase())
        }
    }
}

/// 比较两个文件名的自然顺序
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    NaturalKey::new(a).cmp(&NaturalKey::new(b))
}

/// 排序后的一个文档
#[derive(Debug, Clone)]
pub struct OrderedDocument<'a> {
    pub item: &'a Item,
    /// 原文件名
    pub source_name: String,
    /// 输出文件名
    pub output_name: String,
    /// 从1开始的位置
    pub position: usize,
    /// 上一个文档的输出文件名
    pub prev: Option<String>,
    /// 下一个文档的输出文件名
    pub next: Option<String>,
}

/// 一本书的阅读顺序，创建后不再改变
#[derive(Debug, Clone)]
pub struct ReadingOrder<'a> {
    documents: Vec<OrderedDocument<'a>>,
    by_source: HashMap<String, usize>,
}

impl<'a> ReadingOrder<'a> {
    /// 排序并分配输出文件名
    ///
    /// 排序是稳定的，自然键相同的文档保持传入顺序。
    pub fn new(documents: impl IntoIterator<Item = &'a Item>, naming: NamingStrategy) -> Self {
        let mut keyed: Vec<(NaturalKey, &'a Item)> = documents
            .into_iter()
            .map(|item| (NaturalKey::new(item.basename()), item))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        let output_names: Vec<String> = keyed
            .iter()
            .enumerate()
            .map(|(index, (_, item))| match naming {
                NamingStrategy::Renumber => format!("{}.html", index + 1),
                NamingStrategy::PreserveOriginal => item.basename().to_string(),
            })
            .collect();

        let mut ordered = Vec::with_capacity(keyed.len());
        let mut by_source = HashMap::new();
        for (index, (_, item)) in keyed.into_iter().enumerate() {
            let source_name = item.basename().to_string();
            if by_source.insert(source_name.clone(), index).is_some() {
                tracing::warn!(name = %source_name, "多个文档使用相同的文件名，后出现的覆盖前者");
            }
            ordered.push(OrderedDocument {
                item,
                source_name,
                output_name: output_names[index].clone(),
                position: index + 1,
                prev: index.checked_sub(1).map(|i| output_names[i].clone()),
                next: output_names.get(index + 1).cloned(),
            });
        }

        ReadingOrder {
            documents: ordered,
            by_source,
        }
    }

    pub fn documents(&self) -> &[OrderedDocument<'a>] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 按原文件名查找
    pub fn get(&self, source_name: &str) -> Option<&OrderedDocument<'a>> {
        self.by_source.get(source_name).map(|&index| &self.documents[index])
    }

    /// 原文件名对应的输出文件名
    pub fn output_name(&self, source_name: &str) -> Option<&str> {
        self.get(source_name).map(|document| document.output_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::opf::ItemKind;

    fn document(name: &str) -> Item {
        Item {
            id: name.to_string(),
            href: name.to_string(),
            path: format!("OEBPS/{}", name),
            media_type: "application/xhtml+xml".to_string(),
            kind: ItemKind::Document,
            properties: None,
            content: Vec::new(),
        }
    }

    #[test]
    fn test_natural_sort() {
        let mut names = vec!["ch1.html", "ch10.html", "ch2.html"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["ch1.html", "ch2.html", "ch10.html"]);
    }

    #[test]
    fn test_natural_key_details() {
        assert_eq!(natural_cmp("Chapter2", "chapter2"), Ordering::Equal);
        assert_eq!(natural_cmp("a007", "a7"), Ordering::Equal);
        assert_eq!(natural_cmp("part2_ch10", "part10_ch1"), Ordering::Less);
        assert_eq!(natural_cmp("a99999999999999999999999", "a100000000000000000000000"), Ordering::Less);
        assert_eq!(natural_cmp("1intro", "intro"), Ordering::Less);
    }

    #[test]
    fn test_renumber_and_neighbors() {
        let items = [document("ch10.xhtml"), document("ch1.xhtml"), document("ch2.xhtml")];
        let order = ReadingOrder::new(items.iter(), NamingStrategy::Renumber);

        let names: Vec<&str> = order.documents().iter().map(|d| d.source_name.as_str()).collect();
        assert_eq!(names, vec!["ch1.xhtml", "ch2.xhtml", "ch10.xhtml"]);

        let first = &order.documents()[0];
        assert_eq!(first.output_name, "1.html");
        assert_eq!(first.prev, None);
        assert_eq!(first.next.as_deref(), Some("2.html"));

        let middle = order.get("ch2.xhtml").unwrap();
        assert_eq!(middle.position, 2);
        assert_eq!(middle.prev.as_deref(), Some("1.html"));
        assert_eq!(middle.next.as_deref(), Some("3.html"));

        let last = &order.documents()[2];
        assert_eq!(last.output_name, "3.html");
        assert_eq!(last.next, None);
    }

    #[test]
    fn test_preserve_original_names() {
        let items = [document("b2.xhtml"), document("b1.xhtml")];
        let order = ReadingOrder::new(items.iter(), NamingStrategy::PreserveOriginal);
        assert_eq!(order.output_name("b1.xhtml"), Some("b1.xhtml"));
        assert_eq!(order.documents()[0].next.as_deref(), Some("b2.xhtml"));
        assert_eq!(order.output_name("missing.xhtml"), None);
    }

    #[test]
    fn test_single_document_has_no_neighbors() {
        let items = [document("only.xhtml")];
        let order = ReadingOrder::new(items.iter(), NamingStrategy::Renumber);
        assert_eq!(order.len(), 1);
        assert!(order.documents()[0].prev.is_none());
        assert!(order.documents()[0].next.is_none());
    }
}
