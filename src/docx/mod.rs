mod styles;

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{
    Block, CoreProps, DocxDocument, InlineItem, LookupTables, MediaFile, Paragraph, StyleSet,
    Table, TableCell, TableRow,
};

use styles::{StylesInfo, parse_run_props, parse_styles, resolve_style};

pub(super) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(super) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CP_NS: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const DCTERMS_NS: &str = "http://purl.org/dc/terms/";

pub(super) fn parse_hex_color(val: &str) -> Option<[u8; 3]> {
    if val == "auto" || val.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Parse a WML boolean toggle element (e.g., w:b, w:i).
/// Present with no val or val != "0"/"false" means true.
pub(super) fn wml_bool(parent: roxmltree::Node, name: &str) -> Option<bool> {
    wml(parent, name).map(|n| {
        n.attribute((WML_NS, "val"))
            .is_none_or(|v| v != "0" && v != "false")
    })
}

pub(super) fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

pub(super) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

pub(super) fn read_zip_text<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
    name: &str,
) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Flatten SDT wrappers: descend into w:sdtContent and collect effective children.
fn collect_block_nodes<'a>(parent: roxmltree::Node<'a, 'a>) -> Vec<roxmltree::Node<'a, 'a>> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        if child.tag_name().name() == "sdt" && child.tag_name().namespace() == Some(WML_NS) {
            if let Some(content) = wml(child, "sdtContent") {
                nodes.extend(collect_block_nodes(content));
            }
        } else {
            nodes.push(child);
        }
    }
    nodes
}

pub fn parse(path: &Path) -> Result<DocxDocument> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
        ),
        _ => Error::Io(e),
    })?;

    let mut zip = zip::ZipArchive::new(file)
        .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;
    parse_archive(&mut zip)
}

pub fn parse_bytes(bytes: &[u8]) -> Result<DocxDocument> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;
    parse_archive(&mut zip)
}

fn parse_archive<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> Result<DocxDocument> {
    let styles = parse_styles(zip);
    let rels = parse_relationships(zip);
    let (footnote_texts, footnote_order) = parse_footnotes(zip);
    let core_props = parse_core_props(zip);
    let media = extract_media(zip);
    let lookups = build_lookups(&rels, footnote_texts);

    let mut xml_content = String::new();
    zip.by_name("word/document.xml")
        .map_err(|_| Error::InvalidDocx("missing word/document.xml (is this a DOCX file?)".into()))?
        .read_to_string(&mut xml_content)?;

    let xml = roxmltree::Document::parse(&xml_content)?;
    let root = xml.root_element();

    let body = wml(root, "body").ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;

    let mut blocks = Vec::new();
    for node in collect_block_nodes(body) {
        if !node.is_element() {
            continue;
        }
        if node.tag_name().namespace() != Some(WML_NS) {
            log::debug!("unhandled body node: {}", node.tag_name().name());
            continue;
        }
        match node.tag_name().name() {
            "p" => blocks.push(Block::Paragraph(classify_paragraph(node, &styles, &lookups))),
            "tbl" => blocks.push(Block::Table(classify_table(node, &styles, &lookups))),
            "sectPr" => {}
            other => log::debug!("unhandled body node: {other}"),
        }
    }

    Ok(DocxDocument {
        blocks,
        lookups,
        core_props,
        footnote_order,
        media,
    })
}

/// Classify one paragraph's children into inline items, document order.
/// No merging happens here; adjacent same-styled runs stay separate items.
fn classify_paragraph(
    para_node: roxmltree::Node,
    styles: &StylesInfo,
    lookups: &LookupTables,
) -> Paragraph {
    let mut items = Vec::new();

    for child in para_node.children() {
        if !child.is_element() {
            continue;
        }
        if child.tag_name().namespace() != Some(WML_NS) {
            log::debug!("unhandled paragraph child: {}", child.tag_name().name());
            collect_images(child, lookups, &mut items);
            continue;
        }
        match child.tag_name().name() {
            "pPr" | "proofErr" | "bookmarkStart" | "bookmarkEnd" | "smartTag" => {}
            "hyperlink" => {
                match child
                    .attribute((REL_NS, "id"))
                    .and_then(|rid| lookups.hyperlinks.get(rid))
                {
                    Some(url) => items.push(InlineItem::Hyperlink {
                        url: url.clone(),
                        text: collect_text(child),
                    }),
                    None => {
                        let rid = child.attribute((REL_NS, "id")).unwrap_or("<none>");
                        log::warn!("dropping hyperlink with unresolved relationship {rid}");
                    }
                }
            }
            "r" => {
                if let Some(fn_id) = footnote_reference_id(child) {
                    items.push(InlineItem::FootnoteRef {
                        id: fn_id.to_string(),
                    });
                } else {
                    let text = run_text(child);
                    if !text.is_empty() {
                        let rpr = wml(child, "rPr");
                        let direct = rpr.map(parse_run_props).unwrap_or_default();
                        let named = rpr
                            .and_then(|rpr| wml_attr(rpr, "rStyle"))
                            .and_then(|id| styles.character_styles.get(id))
                            .map(|s| &s.props);
                        items.push(InlineItem::StyledText {
                            text,
                            styles: resolve_style(&direct, named),
                        });
                    }
                }
            }
            other => log::debug!("unhandled paragraph child: {other}"),
        }
        // Drawings can sit inside any child, including ones the dispatch
        // above ignored or could not resolve.
        collect_images(child, lookups, &mut items);
    }

    Paragraph {
        items,
        styles: paragraph_styles(para_node),
    }
}

/// Background shading is the only paragraph-level property carried over.
fn paragraph_styles(para_node: roxmltree::Node) -> StyleSet {
    let mut styles = StyleSet::new();
    let shd = para_node
        .descendants()
        .find(|n| n.tag_name().name() == "shd" && n.tag_name().namespace() == Some(WML_NS));
    if let Some(fill) = shd.and_then(|n| n.attribute((WML_NS, "fill")))
        && fill != "auto"
    {
        styles.push(format!("background-color: #{fill};"));
    }
    styles
}

/// Text of a run: w:t content with tabs and breaks as whitespace.
fn run_text(run_node: roxmltree::Node) -> String {
    let mut text = String::new();
    for child in run_node.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => text.push_str(child.text().unwrap_or("")),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}

/// Concatenated w:t text at any depth, for flattening hyperlink content.
fn collect_text(node: roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| n.tag_name().name() == "t" && n.tag_name().namespace() == Some(WML_NS))
        .map(|n| n.text().unwrap_or(""))
        .collect()
}

fn footnote_reference_id<'a>(run_node: roxmltree::Node<'a, 'a>) -> Option<&'a str> {
    run_node
        .descendants()
        .find(|n| {
            n.tag_name().name() == "footnoteReference" && n.tag_name().namespace() == Some(WML_NS)
        })
        .and_then(|n| n.attribute((WML_NS, "id")))
}

/// One image item per w:drawing strictly inside `child`, each taking the
/// first a:blip it contains. A paragraph child that IS a drawing is not
/// scanned; it surfaces through the unhandled-node diagnostic instead.
fn collect_images(child: roxmltree::Node, lookups: &LookupTables, items: &mut Vec<InlineItem>) {
    for drawing in child.descendants().filter(|n| {
        *n != child && n.tag_name().name() == "drawing" && n.tag_name().namespace() == Some(WML_NS)
    }) {
        let Some(rid) = find_blip_embed(drawing) else {
            continue;
        };
        match lookups.images.get(rid) {
            Some(filename) => items.push(InlineItem::Image {
                rel_id: rid.to_string(),
                filename: filename.clone(),
            }),
            None => log::warn!("dropping image with unresolved relationship {rid}"),
        }
    }
}

fn find_blip_embed<'a>(container: roxmltree::Node<'a, 'a>) -> Option<&'a str> {
    container
        .descendants()
        .find(|n| n.tag_name().name() == "blip" && n.tag_name().namespace() == Some(DML_NS))
        .and_then(|n| n.attribute((REL_NS, "embed")))
}

/// Rows and cells are kept even when empty; a table's shape is part of its
/// content. Nested tables inside cells are not descended into.
fn classify_table(tbl_node: roxmltree::Node, styles: &StylesInfo, lookups: &LookupTables) -> Table {
    let mut rows = Vec::new();
    for tr in collect_block_nodes(tbl_node)
        .into_iter()
        .filter(|n| n.tag_name().name() == "tr" && n.tag_name().namespace() == Some(WML_NS))
    {
        let mut cells = Vec::new();
        for tc in collect_block_nodes(tr)
            .into_iter()
            .filter(|n| n.tag_name().name() == "tc" && n.tag_name().namespace() == Some(WML_NS))
        {
            let paragraphs = collect_block_nodes(tc)
                .into_iter()
                .filter(|n| n.tag_name().name() == "p" && n.tag_name().namespace() == Some(WML_NS))
                .map(|p| classify_paragraph(p, styles, lookups))
                .collect();
            cells.push(TableCell { paragraphs });
        }
        rows.push(TableRow { cells });
    }
    Table { rows }
}

struct Relationship {
    rel_type: String,
    target: String,
}

fn parse_rels_xml(xml_content: &str) -> HashMap<String, Relationship> {
    let mut rels = HashMap::new();
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return rels;
    };
    for node in xml.root_element().children() {
        if node.tag_name().name() == "Relationship"
            && let (Some(id), Some(rel_type), Some(target)) = (
                node.attribute("Id"),
                node.attribute("Type"),
                node.attribute("Target"),
            )
        {
            rels.insert(
                id.to_string(),
                Relationship {
                    rel_type: rel_type.to_string(),
                    target: target.to_string(),
                },
            );
        }
    }
    rels
}

fn parse_relationships<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> HashMap<String, Relationship> {
    let Some(xml_content) = read_zip_text(zip, "word/_rels/document.xml.rels") else {
        return HashMap::new();
    };
    parse_rels_xml(&xml_content)
}

fn build_lookups(
    rels: &HashMap<String, Relationship>,
    footnotes: HashMap<String, String>,
) -> LookupTables {
    let mut hyperlinks = HashMap::new();
    let mut images = HashMap::new();
    for (id, rel) in rels {
        if rel.rel_type.ends_with("/hyperlink") {
            hyperlinks.insert(id.clone(), rel.target.clone());
        } else if rel.rel_type.contains("image") && rel.target.starts_with("media/") {
            let basename = rel.target.rsplit('/').next().unwrap_or(&rel.target);
            images.insert(id.clone(), basename.to_string());
        }
    }
    LookupTables {
        hyperlinks,
        images,
        footnotes,
    }
}

fn parse_footnotes<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
) -> (HashMap<String, String>, Vec<String>) {
    let mut texts = HashMap::new();
    let mut order = Vec::new();

    let Some(xml_text) = read_zip_text(zip, "word/footnotes.xml") else {
        return (texts, order);
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_text) else {
        return (texts, order);
    };

    for node in xml.root_element().children() {
        if node.tag_name().namespace() != Some(WML_NS) || node.tag_name().name() != "footnote" {
            continue;
        }
        // Skip separator/continuationSeparator footnotes (type attribute)
        if node.attribute((WML_NS, "type")).is_some() {
            continue;
        }
        let Some(id) = node.attribute((WML_NS, "id")) else {
            continue;
        };
        let text: String = node
            .descendants()
            .filter(|n| n.tag_name().name() == "t" && n.tag_name().namespace() == Some(WML_NS))
            .map(|n| n.text().unwrap_or(""))
            .collect();
        texts.insert(id.to_string(), text);
        order.push(id.to_string());
    }

    (texts, order)
}

fn parse_core_props<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> CoreProps {
    let Some(xml_content) = read_zip_text(zip, "docProps/core.xml") else {
        return CoreProps::default();
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        return CoreProps::default();
    };
    let root = xml.root_element();

    let text_of = |ns: &str, name: &str| -> Option<String> {
        root.children()
            .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(ns))
            .and_then(|n| n.text())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    };

    CoreProps {
        title: text_of(DC_NS, "title"),
        creator: text_of(DC_NS, "creator"),
        created: text_of(DCTERMS_NS, "created"),
        keywords: text_of(CP_NS, "keywords"),
        language: text_of(DC_NS, "language"),
    }
}

fn extract_media<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> Vec<MediaFile> {
    let mut names: Vec<String> = zip
        .file_names()
        .filter(|n| n.starts_with("word/media/") && !n.ends_with('/'))
        .map(String::from)
        .collect();
    names.sort();

    let mut media = Vec::new();
    for name in names {
        let mut data = Vec::new();
        let read_ok = match zip.by_name(&name) {
            Ok(mut entry) => entry.read_to_end(&mut data).is_ok(),
            Err(_) => false,
        };
        if !read_ok {
            log::warn!("failed to read {name} from package");
            continue;
        }
        let filename = name.rsplit('/').next().unwrap_or(&name).to_string();
        media.push(MediaFile { filename, data });
    }
    media
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = concat!(
        r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
        r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#,
    );

    fn empty_styles() -> StylesInfo {
        StylesInfo {
            character_styles: HashMap::new(),
        }
    }

    fn lookups() -> LookupTables {
        let mut l = LookupTables::default();
        l.hyperlinks
            .insert("rId5".into(), "https://example.com/".into());
        l.images.insert("rId7".into(), "image1.png".into());
        l.footnotes.insert("2".into(), "A note.".into());
        l
    }

    fn classify(body_xml: &str) -> Paragraph {
        let xml = format!("<w:p {NS}>{body_xml}</w:p>");
        let doc = roxmltree::Document::parse(&xml).expect("parse paragraph");
        classify_paragraph(doc.root_element(), &empty_styles(), &lookups())
    }

    fn text_item(text: &str) -> InlineItem {
        InlineItem::StyledText {
            text: text.into(),
            styles: StyleSet::new(),
        }
    }

    #[test]
    fn runs_stay_separate_items() {
        let para = classify(
            r#"<w:r><w:t>one </w:t></w:r><w:r><w:t>two</w:t></w:r>"#,
        );
        assert_eq!(para.items, vec![text_item("one "), text_item("two")]);
    }

    #[test]
    fn ignorable_children_are_skipped() {
        let para = classify(
            r#"<w:pPr><w:jc w:val="center"/></w:pPr>
               <w:proofErr w:type="spellStart"/>
               <w:bookmarkStart w:id="0" w:name="_x"/>
               <w:r><w:t>text</w:t></w:r>
               <w:bookmarkEnd w:id="0"/>"#,
        );
        assert_eq!(para.items, vec![text_item("text")]);
    }

    #[test]
    fn empty_unstyled_runs_produce_no_items() {
        let para = classify(r#"<w:r><w:rPr><w:b/></w:rPr></w:r><w:r><w:t></w:t></w:r>"#);
        assert!(para.items.is_empty());
    }

    #[test]
    fn tabs_and_breaks_become_whitespace() {
        let para = classify(r#"<w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r>"#);
        assert_eq!(para.items, vec![text_item("a\tb\nc")]);
    }

    #[test]
    fn footnote_reference_wins_over_run_text() {
        let para = classify(
            r#"<w:r><w:rPr><w:vertAlign w:val="superscript"/></w:rPr>
               <w:footnoteReference w:id="2"/></w:r>"#,
        );
        assert_eq!(para.items, vec![InlineItem::FootnoteRef { id: "2".into() }]);
    }

    #[test]
    fn hyperlink_flattens_nested_text() {
        let para = classify(
            r#"<w:hyperlink r:id="rId5"><w:r><w:t>click </w:t></w:r><w:r><w:t>here</w:t></w:r></w:hyperlink>"#,
        );
        assert_eq!(
            para.items,
            vec![InlineItem::Hyperlink {
                url: "https://example.com/".into(),
                text: "click here".into(),
            }]
        );
    }

    #[test]
    fn unresolved_hyperlink_is_dropped() {
        let para = classify(r#"<w:hyperlink r:id="rId99"><w:r><w:t>gone</w:t></w:r></w:hyperlink>"#);
        assert!(para.items.is_empty());
    }

    #[test]
    fn image_in_run_follows_run_text() {
        let para = classify(
            r#"<w:r><w:t>fig:</w:t><w:drawing><a:blip r:embed="rId7"/></w:drawing></w:r>"#,
        );
        assert_eq!(
            para.items,
            vec![
                text_item("fig:"),
                InlineItem::Image {
                    rel_id: "rId7".into(),
                    filename: "image1.png".into(),
                },
            ]
        );
    }

    #[test]
    fn bare_drawing_child_is_not_scanned() {
        let para = classify(r#"<w:drawing><a:blip r:embed="rId7"/></w:drawing>"#);
        assert!(para.items.is_empty());
    }

    #[test]
    fn shading_fill_becomes_background() {
        let para = classify(
            r#"<w:pPr><w:shd w:val="clear" w:fill="DDEEFF"/></w:pPr><w:r><w:t>x</w:t></w:r>"#,
        );
        assert_eq!(para.styles.as_attr(), "background-color: #DDEEFF;");

        let auto = classify(
            r#"<w:pPr><w:shd w:val="clear" w:fill="auto"/></w:pPr><w:r><w:t>x</w:t></w:r>"#,
        );
        assert!(auto.styles.is_empty());
    }

    #[test]
    fn table_keeps_empty_cells() {
        let xml = format!(
            r#"<w:tbl {NS}>
                 <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>
                 <w:tr><w:tc><w:p/></w:tc><w:tc><w:p/></w:tc></w:tr>
               </w:tbl>"#
        );
        let doc = roxmltree::Document::parse(&xml).expect("parse table");
        let table = classify_table(doc.root_element(), &empty_styles(), &lookups());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[0].cells[0].paragraphs[0].items, vec![text_item("a")]);
        assert!(table.rows[0].cells[1].paragraphs[0].items.is_empty());
    }

    #[test]
    fn rels_filtering_by_type() {
        let rels_xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.org/" TargetMode="External"/>
            <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
            <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
        </Relationships>"#;
        let rels = parse_rels_xml(rels_xml);
        let lookups = build_lookups(&rels, HashMap::new());

        assert_eq!(
            lookups.hyperlinks.get("rId1").map(String::as_str),
            Some("https://example.org/")
        );
        assert_eq!(
            lookups.images.get("rId2").map(String::as_str),
            Some("image1.png")
        );
        assert!(!lookups.hyperlinks.contains_key("rId3"));
        assert!(!lookups.images.contains_key("rId3"));
    }
}
