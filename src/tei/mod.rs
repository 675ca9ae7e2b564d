mod coalesce;

use chrono::Local;

use crate::model::{Block, CoreProps, DocxDocument, LookupTables, Table};
use crate::xml::Element;

use coalesce::coalesce;

pub struct BuildOptions<'a> {
    /// Source name recorded in the header's `note n="orgfile"`.
    pub orgfile: &'a str,
    /// Value of the `text` element's `id` attribute.
    pub text_id: &'a str,
    /// Directory prefix for `graphic url=` references.
    pub image_reldir: &'a str,
    /// Emit the footnote apparatus after the body.
    pub include_footnotes: bool,
}

/// Assemble the TEI document tree. Paragraphs that coalesce to nothing are
/// suppressed at body level and inside cells; tables always survive.
pub fn build_document(doc: DocxDocument, opts: &BuildOptions) -> Element {
    let DocxDocument {
        blocks,
        lookups,
        core_props,
        footnote_order,
        media: _,
    } = doc;

    let header = build_header(&core_props, opts.orgfile);

    let mut body = Element::new("body");
    for block in blocks {
        match block {
            Block::Paragraph(para) => {
                let p = coalesce(para, &lookups, opts.image_reldir);
                if !p.is_empty() {
                    body.children.push(p);
                }
            }
            Block::Table(table) => {
                body.children
                    .push(build_table(table, &lookups, opts.image_reldir));
            }
        }
    }

    let mut text = Element::new("text")
        .attr("xml:space", "preserve")
        .attr("id", opts.text_id);

    let apparatus = if opts.include_footnotes && !footnote_order.is_empty() {
        Some(build_apparatus(&footnote_order, &lookups))
    } else {
        None
    };
    if apparatus.is_some() {
        body.tail = "\n".into();
    }
    text.children.push(body);
    if let Some(notes) = apparatus {
        text.children.push(notes);
    }

    let mut tei = Element::new("TEI");
    tei.children.push(header);
    tei.children.push(text);
    tei
}

fn build_header(core: &CoreProps, orgfile: &str) -> Element {
    let mut file_desc = Element::new("fileDesc");

    if core.title.is_some() || core.creator.is_some() {
        let mut title_stmt = Element::new("titleStmt");
        if let Some(title) = &core.title {
            title_stmt
                .children
                .push(Element::new("title").with_text(title.clone()));
        }
        if let Some(creator) = &core.creator {
            title_stmt
                .children
                .push(Element::new("author").with_text(creator.clone()));
        }
        file_desc.children.push(title_stmt);
    }

    let mut notes_stmt = Element::new("notesStmt");
    notes_stmt
        .children
        .push(Element::new("note").attr("n", "orgfile").with_text(orgfile));
    file_desc.children.push(notes_stmt);

    let mut header = Element::new("teiHeader");
    header.children.push(file_desc);

    if core.created.is_some() || core.keywords.is_some() || core.language.is_some() {
        let mut profile = Element::new("profileDesc");
        if let Some(created) = &core.created {
            let mut creation = Element::new("creation");
            creation
                .children
                .push(Element::new("date").attr("when", created.clone()));
            profile.children.push(creation);
        }
        if let Some(keywords) = &core.keywords {
            let mut text_class = Element::new("textClass");
            let mut kw = Element::new("keywords");
            kw.children
                .push(Element::new("term").with_text(keywords.clone()));
            text_class.children.push(kw);
            profile.children.push(text_class);
        }
        if let Some(language) = &core.language {
            let mut lang_usage = Element::new("langUsage");
            lang_usage
                .children
                .push(Element::new("language").attr("ident", language.clone()));
            profile.children.push(lang_usage);
        }
        header.children.push(profile);
    }

    let mut revision = Element::new("revisionDesc");
    revision.children.push(
        Element::new("change")
            .attr("who", "docx2tei")
            .attr("when", Local::now().format("%Y-%m-%d").to_string())
            .with_text("Converted from DOCX file"),
    );
    header.children.push(revision);

    header
}

fn build_table(table: Table, lookups: &LookupTables, image_reldir: &str) -> Element {
    let mut tbl = Element::new("table");
    tbl.tail = "\n".into();
    for row in table.rows {
        let mut r = Element::new("row");
        r.tail = "\n".into();
        for cell in row.cells {
            let mut c = Element::new("cell");
            c.tail = "\n".into();
            for para in cell.paragraphs {
                let p = coalesce(para, lookups, image_reldir);
                if !p.is_empty() {
                    c.children.push(p);
                }
            }
            r.children.push(c);
        }
        tbl.children.push(r);
    }
    tbl
}

fn build_apparatus(footnote_order: &[String], lookups: &LookupTables) -> Element {
    let mut notes = Element::new("notes");
    notes.tail = "\n".into();
    for id in footnote_order {
        if let Some(text) = lookups.footnotes.get(id) {
            let mut note = Element::new("note")
                .attr("id", format!("fn-{id}"))
                .with_text(text.clone());
            note.tail = "\n".into();
            notes.children.push(note);
        }
    }
    notes
}
