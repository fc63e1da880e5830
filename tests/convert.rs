mod common;

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use bookshelf::slim::{self, SlimOptions};
use bookshelf::{convert_library, Archive, BatchEvent, ItemKind, SiteConfig, SiteEmitter};
use common::{file_names, write_epub};

/// 把源文件的修改时间调早，保证输出一定比它新
fn age(path: &Path) {
    let older = SystemTime::now() - Duration::from_secs(3600);
    fs::File::options().write(true).open(path).unwrap().set_modified(older).unwrap();
}

fn library(input: &Path) {
    let alpha = write_epub(
        input,
        "book1.epub",
        "Alpha",
        &[("chapter2.xhtml", "Second"), ("chapter1.xhtml", "First")],
    );
    let beta = write_epub(input, "book2.epub", "Beta", &[("only.xhtml", "Only")]);
    age(&alpha);
    age(&beta);
}

#[test]
fn converts_two_books_into_a_bookshelf() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    library(input.path());

    let emitter = SiteEmitter::new(SiteConfig::default()).unwrap();
    let report = convert_library(input.path(), output.path(), &emitter, false, |_| {}).unwrap();
    assert_eq!(report.discovered, 2);
    assert_eq!(report.converted, 2);
    assert!(report.failed.is_empty());

    let shelf = fs::read_to_string(output.path().join("index.html")).unwrap();
    let alpha = shelf.find("<a href=\"book1/index.html\"><span>Alpha</span></a>").unwrap();
    let beta = shelf.find("<a href=\"book2/index.html\"><span>Beta</span></a>").unwrap();
    assert!(alpha < beta);

    let chapters = output.path().join("book1/chapters");
    assert_eq!(file_names(&chapters), vec!["1.html", "2.html"]);

    let first = fs::read_to_string(chapters.join("1.html")).unwrap();
    assert!(first.contains("<title>First</title>"));
    assert!(first.contains("<span class=\"disabled\">Prev</span>"));
    assert!(first.contains("<a href=\"2.html\">Next</a>"));
    assert!(!first.contains("<img"));

    let second = fs::read_to_string(chapters.join("2.html")).unwrap();
    assert!(second.contains("<title>Second</title>"));
    assert!(second.contains("<a href=\"1.html\">Prev</a>"));
    assert!(second.contains("<span class=\"disabled\">Next</span>"));

    let contents = fs::read_to_string(output.path().join("book1/index.html")).unwrap();
    assert!(contents.contains("<a href=\"chapters/1.html\">First</a>"));
    assert!(contents.contains("<a href=\"chapters/2.html\">Second</a>"));
    assert_eq!(file_names(&output.path().join("book2/chapters")), vec!["1.html"]);
}

#[test]
fn rerun_skips_fresh_books_and_keeps_the_shelf() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    library(input.path());
    let emitter = SiteEmitter::new(SiteConfig::default()).unwrap();

    convert_library(input.path(), output.path(), &emitter, false, |_| {}).unwrap();
    let before = fs::read(output.path().join("index.html")).unwrap();

    let mut skipped = Vec::new();
    let report = convert_library(input.path(), output.path(), &emitter, false, |event| {
        if let BatchEvent::Skipped { name, .. } = event {
            skipped.push(name.to_string());
        }
    })
    .unwrap();
    let after = fs::read(output.path().join("index.html")).unwrap();

    assert_eq!(skipped, vec!["book1.epub", "book2.epub"]);
    assert_eq!(report.converted, 0);
    assert_eq!(before, after);

    let forced = convert_library(input.path(), output.path(), &emitter, true, |_| {}).unwrap();
    assert_eq!(forced.converted, 2);
    assert_eq!(fs::read(output.path().join("index.html")).unwrap(), before);
}

#[test]
fn standalone_mode_keeps_source_names() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    library(input.path());

    let emitter = SiteEmitter::new(SiteConfig::standalone()).unwrap();
    convert_library(input.path(), output.path(), &emitter, false, |_| {}).unwrap();

    let chapters = output.path().join("book1/chapters");
    assert_eq!(file_names(&chapters), vec!["chapter1.xhtml", "chapter2.xhtml"]);
    let first = fs::read_to_string(chapters.join("chapter1.xhtml")).unwrap();
    assert!(first.contains("<a href=\"chapter2.xhtml\">Next</a>"));
}

#[test]
fn slimming_a_directory_mirrors_file_names() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    library(input.path());

    let jobs = slim::plan(input.path(), Some(output.path())).unwrap();
    assert_eq!(jobs.len(), 2);
    for job in &jobs {
        let outcome = slim::slim_file(job, &SlimOptions::default()).unwrap();
        assert!(outcome.after > 0);
    }

    assert_eq!(file_names(output.path()), vec!["book1.epub", "book2.epub"]);
    let slimmed = Archive::open(output.path().join("book1.epub")).unwrap();
    assert_eq!(slimmed.items_of_type(ItemKind::Image).count(), 0);
    assert_eq!(slimmed.documents().count(), 2);
    assert_eq!(slimmed.title(), Some("Alpha"));
}
