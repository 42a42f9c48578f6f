//! End-to-end template workflows over real files on disk.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;
use templet::custom_props::CustomProperties;
use templet::docx::FieldLocator;
use templet::engine;
use templet::mapping::Mapping;
use templet::opc::Package;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A minimal document with two named fields in the body and one in a header.
fn build_docx(path: &Path) {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
    <Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>
</Types>"#).unwrap();

    writer.start_file("_rels/.rels", options).unwrap();
    writer.write_all(br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#).unwrap();

    writer.start_file("word/_rels/document.xml.rels", options).unwrap();
    writer.write_all(br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>
</Relationships>"#).unwrap();

    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(br#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:body>
        <w:sdt><w:sdtPr><w:alias w:val="Name"/><w:showingPlcHdr/></w:sdtPr><w:sdtContent><w:r><w:t>Click here to enter text.</w:t></w:r></w:sdtContent></w:sdt>
        <w:sdt><w:sdtPr><w:alias w:val="City"/><w:showingPlcHdr/></w:sdtPr><w:sdtContent><w:r><w:t>Click here to enter text.</w:t></w:r></w:sdtContent></w:sdt>
    </w:body>
</w:document>"#).unwrap();

    writer.start_file("word/header1.xml", options).unwrap();
    writer.write_all(br#"<?xml version="1.0"?>
<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:sdt><w:sdtPr><w:alias w:val="Department"/></w:sdtPr><w:sdtContent><w:r><w:t>dep</w:t></w:r></w:sdtContent></w:sdt>
</w:hdr>"#).unwrap();

    let bytes = writer.finish().unwrap().into_inner();
    std::fs::write(path, bytes).unwrap();
}

fn open_package(path: &Path) -> Package {
    let mut file = File::open(path).unwrap();
    Package::read_from(&mut file, false).unwrap()
}

#[test]
fn test_create_persists_stub_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("letter.docx");
    let output = dir.path().join("letter-template.docx");
    build_docx(&source);

    engine::create_from_template(&source, &output).unwrap();

    let pkg = open_package(&output);
    let mapping = Mapping::load(&pkg).unwrap();
    let entries: Vec<_> = mapping
        .iter()
        .map(|e| (e.name().to_string(), e.data_path().map(str::to_string)))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("Name".to_string(), Some(" ".to_string())),
            ("City".to_string(), Some(" ".to_string())),
            ("Department".to_string(), Some(" ".to_string())),
        ]
    );

    // The source document itself carries no mapping.
    let source_pkg = open_package(&source);
    assert!(Mapping::load(&source_pkg).unwrap().is_empty());
}

#[test]
fn test_fill_replaces_text_and_drops_markers() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("letter.docx");
    let template = dir.path().join("letter-template.docx");
    build_docx(&source);
    engine::create_from_template(&source, &template).unwrap();

    let mut resolver = |name: &str| match name {
        "Name" => Some("Ivan".to_string()),
        "City" => Some("   ".to_string()),
        _ => None,
    };
    engine::process(&template, &mut resolver).unwrap();

    let pkg = open_package(&template);
    let fields: Vec<_> = FieldLocator::new(&pkg)
        .fields()
        .unwrap()
        .map(Result::unwrap)
        .collect();
    let name = fields.iter().find(|f| f.name() == Some("Name")).unwrap();
    assert_eq!(name.text(), "Ivan");
    assert!(!name.has_placeholder_marker());

    // A blank resolution leaves the field untouched, marker included.
    let city = fields.iter().find(|f| f.name() == Some("City")).unwrap();
    assert_eq!(city.text(), "Click here to enter text.");
    assert!(city.has_placeholder_marker());

    // Untouched sub-parts survive byte-for-byte.
    let header = pkg.blob("word/header1.xml").unwrap();
    assert!(
        std::str::from_utf8(header)
            .unwrap()
            .contains(r#"<w:sdt><w:sdtPr><w:alias w:val="Department"/></w:sdtPr>"#)
    );
}

#[test]
fn test_fill_offers_every_live_field_to_the_resolver() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("letter.docx");
    build_docx(&doc);

    // Persist a mapping naming only one of the three live fields; the
    // mapping gates whether the document is a template, not which fields
    // get offered for filling.
    let data = std::fs::read(&doc).unwrap();
    let mut pkg = Package::from_bytes(&data, true).unwrap();
    let mut props = CustomProperties::new();
    props.push("TPL_Name", BASE64.encode(" "), 2);
    props.write_to_package(&mut pkg).unwrap();
    std::fs::write(&doc, pkg.to_bytes().unwrap()).unwrap();

    let mut seen = Vec::new();
    let mut resolver = |name: &str| {
        seen.push(name.to_string());
        None::<String>
    };
    engine::process(&doc, &mut resolver).unwrap();
    drop(resolver);
    assert_eq!(seen, vec!["Name", "City", "Department"]);
}

#[test]
fn test_fill_twice_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("letter.docx");
    let template = dir.path().join("letter-template.docx");
    build_docx(&source);
    engine::create_from_template(&source, &template).unwrap();

    let mut first = |name: &str| (name == "Name").then(|| "Ivan".to_string());
    engine::process(&template, &mut first).unwrap();
    let mut second = |name: &str| (name == "Name").then(|| "Maria".to_string());
    engine::process(&template, &mut second).unwrap();

    let pkg = open_package(&template);
    let fields: Vec<_> = FieldLocator::new(&pkg)
        .fields()
        .unwrap()
        .map(Result::unwrap)
        .collect();
    let name = fields.iter().find(|f| f.name() == Some("Name")).unwrap();
    assert_eq!(name.text(), "Maria");

    // The mapping survives refills untouched.
    let mapping = Mapping::load(&pkg).unwrap();
    assert_eq!(mapping.len(), 3);
}

#[test]
fn test_show_on_plain_document_finds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("letter.docx");
    build_docx(&source);

    // Not an error, just an empty mapping.
    engine::show_mapping(&source).unwrap();
    let pkg = open_package(&source);
    assert!(Mapping::load(&pkg).unwrap().is_empty());
}

#[test]
fn test_create_output_remains_valid_package() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("letter.docx");
    let output = dir.path().join("out.docx");
    build_docx(&source);
    engine::create_from_template(&source, &output).unwrap();

    let pkg = open_package(&output);
    assert_eq!(pkg.main_document_part().unwrap(), "word/document.xml");
    // The custom properties part is registered in the content types and the
    // package relationships.
    let types = pkg.content_types().unwrap();
    assert!(types.content_type_of("docProps/custom.xml").is_some());
    assert!(
        pkg.package_relationships().unwrap().contains_type(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/custom-properties"
        )
    );
}
