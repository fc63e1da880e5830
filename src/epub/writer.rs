//! 把 [`Archive`] 重新打包为EPUB
//!
//! `mimetype` 总是第一个条目且不压缩，其余条目使用deflate。OPF会同步删去
//! 已不存在的清单项，以及引用它们的 `<itemref>` 和 `<guide>` 条目。

use std::collections::HashSet;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::epub::archive::Archive;
use crate::epub::error::{EpubError, Result};
use crate::epub::path;
use crate::epub::reader::EPUB_MIMETYPE;
use crate::epub::toc::split_fragment;
use crate::epub::xml;

impl Archive {
    /// 序列化为EPUB字节
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("mimetype", stored)?;
        zip.write_all(EPUB_MIMETYPE.as_bytes())?;

        for resource in self.resources() {
            if resource.name == "mimetype" {
                continue;
            }
            zip.start_file(resource.name.as_str(), deflated)?;
            if resource.name == self.opf_path() {
                let opf = String::from_utf8_lossy(&resource.data);
                zip.write_all(&self.rewrite_opf(&opf)?)?;
            } else {
                zip.write_all(&resource.data)?;
            }
        }

        for item in self.items() {
            zip.start_file(item.path.as_str(), deflated)?;
            zip.write_all(&item.content)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// 删去OPF中指向已移除条目的引用，其余内容原样保留
    fn rewrite_opf(&self, opf: &str) -> Result<Vec<u8>> {
        let kept: HashSet<&str> = self.items().iter().map(|item| item.id.as_str()).collect();
        let removed_ids: HashSet<&str> = self
            .opf()
            .manifest
            .iter()
            .map(|entry| entry.id.as_str())
            .filter(|id| !kept.contains(id))
            .collect();
        if removed_ids.is_empty() {
            return Ok(opf.as_bytes().to_vec());
        }
        let removed_paths: HashSet<String> = self
            .opf()
            .manifest
            .iter()
            .filter(|entry| removed_ids.contains(entry.id.as_str()))
            .map(|entry| path::resolve_href(self.opf_path(), &entry.href))
            .collect();

        let is_removed = |e: &BytesStart| -> Result<bool> {
            Ok(match xml::local_name(e).as_str() {
                "item" => xml::attribute(e, "id")?.is_some_and(|id| removed_ids.contains(id.as_str())),
                "itemref" => xml::attribute(e, "idref")?.is_some_and(|id| removed_ids.contains(id.as_str())),
                "reference" => xml::attribute(e, "href")?.is_some_and(|href| {
                    let resolved = path::resolve_href(self.opf_path(), &href);
                    removed_paths.contains(split_fragment(&resolved).0)
                }),
                _ => false,
            })
        };

        let mut reader = Reader::from_str(opf);
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        // 被删除元素的嵌套深度，0表示正常输出
        let mut skip_depth = 0usize;

        loop {
            let event = reader.read_event().map_err(|e| EpubError::OpfParseError(format!("XML解析错误: {}", e)))?;
            match event {
                Event::Eof => break,
                Event::Start(ref e) if skip_depth > 0 || is_removed(e)? => skip_depth += 1,
                Event::End(_) if skip_depth > 0 => skip_depth -= 1,
                Event::Empty(ref e) if is_removed(e)? => {}
                _ if skip_depth > 0 => {}
                other => writer.write_event(other)?,
            }
        }

        Ok(writer.into_inner().into_inner())
    }
}

#[cfg(test)]
mod tests {
    use crate::epub::archive::Archive;
    use crate::epub::opf::ItemKind;
    use crate::testing::FixtureBook;

    fn sample() -> Archive {
        let bytes = FixtureBook::new("Alpha")
            .chapter("ch1.xhtml", "第一章", "<p>一</p>")
            .image("cover.jpg")
            .build();
        Archive::from_bytes(bytes).unwrap()
    }

    #[test]
    fn test_round_trip_keeps_items() {
        let archive = sample();
        let reopened = Archive::from_bytes(archive.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.items().len(), archive.items().len());
        assert_eq!(reopened.title(), Some("Alpha"));
        assert_eq!(reopened.resources()[0].name, "mimetype");
    }

    #[test]
    fn test_removed_items_leave_the_package_document() {
        let archive = sample();
        let kept = archive
            .items()
            .iter()
            .filter(|item| item.kind != ItemKind::Image)
            .cloned()
            .collect();
        let bytes = archive.with_items(kept).to_bytes().unwrap();

        let reopened = Archive::from_bytes(bytes).unwrap();
        assert_eq!(reopened.items_of_type(ItemKind::Image).count(), 0);
        assert!(reopened.opf().manifest.iter().all(|entry| !entry.href.contains("cover.jpg")));

        let opf = reopened
            .resources()
            .iter()
            .find(|resource| resource.name == reopened.opf_path())
            .map(|resource| String::from_utf8_lossy(&resource.data).into_owned())
            .unwrap();
        assert!(!opf.contains("<reference"));
        assert!(opf.contains("<itemref idref=\"doc0\"/>"));
    }
}
