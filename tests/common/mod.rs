use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Namespace declarations for a `w:document` root, matching what Word emits.
pub const DOCUMENT_NS: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing""#,
);

/// Wrap body content in a complete `word/document.xml`.
pub fn document_xml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <w:document {DOCUMENT_NS}><w:body>{body}</w:body></w:document>"
    )
}

/// Assemble a DOCX package in memory: `word/document.xml` plus any extra
/// entries (styles, rels, footnotes, media) the test needs.
pub fn build_docx(document: &str, extras: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    zip.start_file("word/document.xml", options)
        .expect("start document.xml");
    zip.write_all(document.as_bytes())
        .expect("write document.xml");

    for (name, data) in extras {
        zip.start_file(*name, options).expect("start zip entry");
        zip.write_all(data).expect("write zip entry");
    }

    zip.finish().expect("finish zip").into_inner()
}
