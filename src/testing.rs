//! 测试用的内存EPUB构造器

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

enum Entry {
    Chapter { file: String, title: String, body: String },
    Asset { dir: &'static str, file: String, media_type: String, data: Vec<u8> },
}

/// 按需拼装一本最小可用的EPUB
pub struct FixtureBook {
    title: String,
    mimetype: Option<String>,
    ncx: bool,
    entries: Vec<Entry>,
}

impl FixtureBook {
    pub fn new(title: &str) -> Self {
        FixtureBook {
            title: title.to_string(),
            mimetype: Some("application/epub+zip".to_string()),
            ncx: true,
            entries: Vec::new(),
        }
    }

    pub fn mimetype(mut self, mimetype: Option<&str>) -> Self {
        self.mimetype = mimetype.map(str::to_string);
        self
    }

    /// 不生成NCX
    pub fn without_toc(mut self) -> Self {
        self.ncx = false;
        self
    }

    pub fn chapter(mut self, file: &str, title: &str, body: &str) -> Self {
        self.entries.push(Entry::Chapter {
            file: file.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        self
    }

    pub fn image(self, file: &str) -> Self {
        self.asset("images", file, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    pub fn font(self, file: &str) -> Self {
        self.asset("fonts", file, "font/ttf", vec![0, 1, 0, 0])
    }

    pub fn style(self, file: &str, css: &str) -> Self {
        self.asset("styles", file, "text/css", css.as_bytes().to_vec())
    }

    pub fn asset(mut self, dir: &'static str, file: &str, media_type: &str, data: Vec<u8>) -> Self {
        self.entries.push(Entry::Asset {
            dir,
            file: file.to_string(),
            media_type: media_type.to_string(),
            data,
        });
        self
    }

    fn opf(&self) -> String {
        let mut manifest = String::new();
        let mut spine = String::new();
        let mut guide = String::new();
        if self.ncx {
            manifest.push_str(r#"<item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>"#);
        }
        for (index, entry) in self.entries.iter().enumerate() {
            match entry {
                Entry::Chapter { file, .. } => {
                    manifest.push_str(&format!(
                        r#"<item id="doc{index}" href="text/{file}" media-type="application/xhtml+xml"/>"#
                    ));
                    spine.push_str(&format!(r#"<itemref idref="doc{index}"/>"#));
                }
                Entry::Asset { dir, file, media_type, .. } => {
                    manifest.push_str(&format!(
                        r#"<item id="res{index}" href="{dir}/{file}" media-type="{media_type}"/>"#
                    ));
                    if *dir == "images" && guide.is_empty() {
                        guide = format!(r#"<guide><reference type="cover" title="Cover" href="{dir}/{file}"/></guide>"#);
                    }
                }
            }
        }
        let title = if self.title.is_empty() {
            String::new()
        } else {
            format!("<dc:title>{}</dc:title>", self.title)
        };
        let toc_attr = if self.ncx { r#" toc="ncx""# } else { "" };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">{title}<dc:identifier id="BookId">urn:uuid:fixture</dc:identifier></metadata>
<manifest>{manifest}</manifest>
<spine{toc_attr}>{spine}</spine>
{guide}
</package>"#
        )
    }

    fn ncx(&self) -> String {
        let points: String = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match entry {
                Entry::Chapter { file, title, .. } => Some(format!(
                    r#"<navPoint id="np{index}" playOrder="{index}"><navLabel><text>{title}</text></navLabel><content src="text/{file}"/></navPoint>"#
                )),
                Entry::Asset { .. } => None,
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
<docTitle><text>{}</text></docTitle>
<navMap>{points}</navMap>
</ncx>"#,
            self.title
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        if let Some(mimetype) = &self.mimetype {
            zip.start_file("mimetype", options).unwrap();
            zip.write_all(mimetype.as_bytes()).unwrap();
        }
        zip.start_file("META-INF/container.xml", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
<rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#,
        )
        .unwrap();
        zip.start_file("OEBPS/content.opf", options).unwrap();
        zip.write_all(self.opf().as_bytes()).unwrap();
        if self.ncx {
            zip.start_file("OEBPS/toc.ncx", options).unwrap();
            zip.write_all(self.ncx().as_bytes()).unwrap();
        }

        for entry in &self.entries {
            match entry {
                Entry::Chapter { file, title, body } => {
                    zip.start_file(format!("OEBPS/text/{file}"), options).unwrap();
                    let page = format!(
                        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{title}</title></head>
<body>{body}</body>
</html>"#
                    );
                    zip.write_all(page.as_bytes()).unwrap();
                }
                Entry::Asset { dir, file, data, .. } => {
                    zip.start_file(format!("OEBPS/{dir}/{file}"), options).unwrap();
                    zip.write_all(data).unwrap();
                }
            }
        }

        zip.finish().unwrap().into_inner()
    }
}
