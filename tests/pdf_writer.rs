//! PDF writer tests. Output is read back with `lopdf`.

mod common;

use std::fs;

use common::frame;
use framedeck::{
    CaptionStyle, DocumentOptions, DocumentWriter, ErrorKind, FramedeckError, OutputFormat,
    PdfWriter,
};

fn page_count(path: &std::path::Path) -> usize {
    lopdf::Document::load(path)
        .expect("output should parse as PDF")
        .get_pages()
        .len()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn media_boxes(path: &std::path::Path) -> Vec<Vec<f32>> {
    let document = lopdf::Document::load(path).expect("output should parse as PDF");
    document
        .get_pages()
        .values()
        .map(|&id| {
            document
                .get_object(id)
                .and_then(lopdf::Object::as_dict)
                .and_then(|page| page.get(b"MediaBox"))
                .and_then(lopdf::Object::as_array)
                .expect("page has a MediaBox")
                .iter()
                .map(|value| value.as_float().expect("numeric MediaBox entry"))
                .collect()
        })
        .collect()
}

#[test]
fn one_page_per_frame_in_order() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("frames.pdf");

    let mut writer = PdfWriter::open(&path, DocumentOptions::default()).unwrap();
    for (index, seconds) in [(0, 0), (1, 30), (2, 60)] {
        writer.add_frame(frame(index, seconds, 64, 48)).unwrap();
    }
    assert_eq!(writer.frames_written(), 3);
    let finished = writer.finalize().expect("finalize");

    assert_eq!(finished, path);
    assert_eq!(page_count(&path), 3);

    let bytes = fs::read(&path).unwrap();
    assert!(contains(&bytes, b"/DCTDecode"));
    let captions = ["(00:00:00) Tj", "(00:00:30) Tj", "(00:01:00) Tj"];
    let positions: Vec<usize> = captions
        .iter()
        .map(|caption| {
            bytes
                .windows(caption.len())
                .position(|window| window == caption.as_bytes())
                .unwrap_or_else(|| panic!("caption {caption} missing"))
        })
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn numbered_captions() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("numbered.pdf");
    let options = DocumentOptions {
        caption_style: CaptionStyle::Numbered,
        ..DocumentOptions::default()
    };

    let mut writer = PdfWriter::open(&path, options).unwrap();
    writer.add_frame(frame(2, 60, 32, 32)).unwrap();
    writer.finalize().unwrap();

    assert!(contains(&fs::read(&path).unwrap(), b"(Frame 3 : 00:01:00) Tj"));
}

#[test]
fn without_captions_no_font_is_used() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("bare.pdf");
    let options = DocumentOptions {
        caption_style: CaptionStyle::None,
        ..DocumentOptions::default()
    };

    let mut writer = PdfWriter::open(&path, options).unwrap();
    writer.add_frame(frame(0, 0, 32, 32)).unwrap();
    writer.finalize().unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(page_count(&path), 1);
    assert!(!contains(&bytes, b" Tj"));
}

#[test]
fn empty_document_is_rejected() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("empty.pdf");

    let mut writer = PdfWriter::open(&path, DocumentOptions::default()).unwrap();
    let error = writer.finalize().unwrap_err();
    assert!(matches!(
        error,
        FramedeckError::EmptyDocument {
            format: OutputFormat::Pdf
        }
    ));
    assert_eq!(error.kind(), ErrorKind::EmptyDocument);
}

#[test]
fn writer_is_closed_after_finalize() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("closed.pdf");

    let mut writer = PdfWriter::open(&path, DocumentOptions::default()).unwrap();
    writer.add_frame(frame(0, 0, 16, 16)).unwrap();
    writer.finalize().unwrap();

    let error = writer.add_frame(frame(1, 1, 16, 16)).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::WriterClosed);
    let error = writer.finalize().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::WriterClosed);
    assert_eq!(page_count(&path), 1);
}

#[test]
fn second_writer_on_same_path_is_refused() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("shared.pdf");

    let mut first = PdfWriter::open(&path, DocumentOptions::default()).unwrap();
    let second = OutputFormat::Pptx.open_writer(&path, &DocumentOptions::default());
    assert!(matches!(second, Err(FramedeckError::OutputPathInUse(_))));

    first.add_frame(frame(0, 0, 16, 16)).unwrap();
    first.finalize().unwrap();

    // The lease is released by finalize.
    let mut third = PdfWriter::open(&path, DocumentOptions::default()).unwrap();
    third.add_frame(frame(0, 0, 16, 16)).unwrap();
    third.finalize().unwrap();
}

#[test]
fn dropping_a_writer_releases_its_path() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("dropped.pdf");

    drop(PdfWriter::open(&path, DocumentOptions::default()).unwrap());
    assert!(PdfWriter::open(&path, DocumentOptions::default()).is_ok());
}

#[test]
fn existing_file_is_overwritten() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("old.pdf");
    fs::write(&path, b"stale contents").unwrap();

    let mut writer = PdfWriter::open(&path, DocumentOptions::default()).unwrap();
    writer.add_frame(frame(0, 0, 16, 16)).unwrap();
    writer.finalize().unwrap();

    assert!(fs::read(&path).unwrap().starts_with(b"%PDF-"));
}

#[test]
fn missing_parent_directory_is_invalid() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("no/such/dir/out.pdf");

    let error = PdfWriter::open(&path, DocumentOptions::default()).err().unwrap();
    assert_eq!(error.kind(), ErrorKind::OutputPathInvalid);
    assert!(!path.exists());
}

#[test]
fn directory_is_not_a_valid_output() {
    let directory = tempfile::tempdir().unwrap();
    let error = PdfWriter::open(directory.path(), DocumentOptions::default())
        .err()
        .unwrap();
    assert_eq!(error.kind(), ErrorKind::OutputPathInvalid);
}

#[test]
fn dot_dot_alias_shares_the_lease() {
    let directory = tempfile::tempdir().unwrap();
    fs::create_dir(directory.path().join("nested")).unwrap();
    let path = directory.path().join("shared.pdf");
    let alias = directory.path().join("nested/../shared.pdf");

    let _first = PdfWriter::open(&path, DocumentOptions::default()).unwrap();
    let second = PdfWriter::open(&alias, DocumentOptions::default());
    assert!(matches!(second, Err(FramedeckError::OutputPathInUse(_))));
}

#[cfg(unix)]
#[test]
fn symlinked_directory_shares_the_lease() {
    let directory = tempfile::tempdir().unwrap();
    let real = directory.path().join("real");
    fs::create_dir(&real).unwrap();
    std::os::unix::fs::symlink(&real, directory.path().join("link")).unwrap();

    let _first = OutputFormat::Pptx
        .open_writer(&real.join("deck.pptx"), &DocumentOptions::default())
        .unwrap();
    let second = OutputFormat::Pptx.open_writer(
        &directory.path().join("link/deck.pptx"),
        &DocumentOptions::default(),
    );
    assert!(matches!(second, Err(FramedeckError::OutputPathInUse(_))));
}

#[test]
fn long_caption_widens_a_narrow_page() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("narrow.pdf");
    let options = DocumentOptions {
        caption_style: CaptionStyle::Numbered,
        ..DocumentOptions::default()
    };

    let mut writer = PdfWriter::open(&path, options).unwrap();
    writer.add_frame(frame(0, 0, 16, 16)).unwrap();
    writer.add_frame(frame(1, 30, 640, 16)).unwrap();
    writer.finalize().unwrap();

    let boxes = media_boxes(&path);
    assert_eq!(boxes.len(), 2);
    // 16 px is 12 pt; "Frame 1 : 00:00:00" needs about 100 pt of Helvetica.
    let narrow = &boxes[0];
    assert!(narrow[2] - narrow[0] > 100.0, "{narrow:?}");
    assert_eq!(narrow[3] - narrow[1], 12.0 + 28.0);
    // A frame wider than its caption keeps its own width.
    let wide = &boxes[1];
    assert_eq!(wide[2] - wide[0], 480.0);

    let bytes = fs::read(&path).unwrap();
    assert!(contains(&bytes, b"(Frame 1 : 00:00:00) Tj"));
}

#[test]
fn objects_reach_disk_before_finalize() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("streamed.pdf");

    let mut writer = PdfWriter::open(&path, DocumentOptions::default()).unwrap();
    for index in 0..50 {
        writer.add_frame(frame(index, index * 10, 64, 48)).unwrap();
    }
    let before = fs::metadata(&path).unwrap().len();
    assert!(before > 0);
    writer.finalize().unwrap();
    assert!(fs::metadata(&path).unwrap().len() > before);

    assert_eq!(page_count(&path), 50);
}

#[test]
fn cross_reference_offsets_point_at_their_objects() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("xref.pdf");

    let mut writer = PdfWriter::open(&path, DocumentOptions::default()).unwrap();
    for index in 0..3 {
        writer.add_frame(frame(index, index, 32, 24)).unwrap();
    }
    writer.finalize().unwrap();

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7\n"));
    assert!(bytes.ends_with(b"%%EOF\n"));

    let marker = find(&bytes, b"startxref\n").expect("startxref");
    let tail = std::str::from_utf8(&bytes[marker + 10..]).unwrap();
    let start: usize = tail.lines().next().unwrap().parse().unwrap();
    let table = std::str::from_utf8(&bytes[start..]).unwrap();
    let mut lines = table.lines();
    assert_eq!(lines.next(), Some("xref"));
    let size: usize = lines
        .next()
        .and_then(|line| line.strip_prefix("0 "))
        .and_then(|count| count.parse().ok())
        .expect("subsection header");
    // Catalog, page tree, font, info, then page, image and content per frame.
    assert_eq!(size, 5 + 3 * 3);

    for id in 1..size {
        let entry = table.lines().nth(2 + id).unwrap();
        assert!(entry.ends_with(" 00000 n"), "{entry:?}");
        let offset: usize = entry[..10].parse().unwrap();
        let expected = format!("{id} 0 obj");
        assert!(bytes[offset..].starts_with(expected.as_bytes()), "object {id}");
    }
}
