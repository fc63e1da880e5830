//! 集成测试共用的EPUB构造

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 写入一本只含章节和一张图片的EPUB，章节为 `(文件名, 标题)`
pub fn write_epub(dir: &Path, file: &str, title: &str, chapters: &[(&str, &str)]) -> PathBuf {
    let mut manifest = String::from(
        r#"<item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/><item id="cover" href="cover.jpg" media-type="image/jpeg"/>"#,
    );
    let mut spine = String::new();
    let mut nav_points = String::new();
    for (index, (name, chapter_title)) in chapters.iter().enumerate() {
        manifest.push_str(&format!(
            r#"<item id="c{index}" href="{name}" media-type="application/xhtml+xml"/>"#
        ));
        spine.push_str(&format!(r#"<itemref idref="c{index}"/>"#));
        nav_points.push_str(&format!(
            r#"<navPoint id="n{index}"><navLabel><text>{chapter_title}</text></navLabel><content src="{name}"/></navPoint>"#
        ));
    }

    let opf = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
<metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{title}</dc:title></metadata>
<manifest>{manifest}</manifest>
<spine toc="ncx">{spine}</spine>
</package>"#
    );
    let ncx = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/"><navMap>{nav_points}</navMap></ncx>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let options = SimpleFileOptions::default();
    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    zip.start_file("META-INF/container.xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
<rootfiles><rootfile full-path="content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#,
    )
    .unwrap();
    zip.start_file("content.opf", options).unwrap();
    zip.write_all(opf.as_bytes()).unwrap();
    zip.start_file("toc.ncx", options).unwrap();
    zip.write_all(ncx.as_bytes()).unwrap();
    zip.start_file("cover.jpg", options).unwrap();
    zip.write_all(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0]).unwrap();
    for (name, chapter_title) in chapters {
        zip.start_file(*name, options).unwrap();
        let page = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>{chapter_title}</title></head>
<body><h1>{chapter_title}</h1><p>正文<img src="cover.jpg"/></p></body></html>"#
        );
        zip.write_all(page.as_bytes()).unwrap();
    }
    let bytes = zip.finish().unwrap().into_inner();

    let path = dir.join(file);
    fs::write(&path, bytes).unwrap();
    path
}

/// 目录中的文件名，已排序
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
