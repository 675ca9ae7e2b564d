use std::collections::HashMap;

/// CSS-like style declarations resolved for a run or paragraph. The attribute
/// form keeps emission order; equality is on the canonical form, so reordered
/// or repeated declarations still compare equal for run merging.
#[derive(Clone, Debug, Default)]
pub struct StyleSet {
    decls: Vec<String>,
}

impl StyleSet {
    pub fn new() -> Self {
        StyleSet::default()
    }

    pub fn push(&mut self, decl: impl Into<String>) {
        self.decls.push(decl.into());
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Attribute form: declarations joined with a single space, in the order
    /// they were pushed.
    pub fn as_attr(&self) -> String {
        self.decls.join(" ")
    }

    /// Canonical form: trimmed, sorted, deduplicated.
    pub fn canonical(&self) -> String {
        let mut parts: Vec<String> = self.decls.iter().map(|d| d.trim().to_string()).collect();
        parts.sort();
        parts.dedup();
        parts.join(" ")
    }
}

impl PartialEq for StyleSet {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

/// One classified inline item of a paragraph, in document order.
#[derive(Clone, Debug, PartialEq)]
pub enum InlineItem {
    /// Run text with its resolved style set (possibly empty).
    StyledText { text: String, styles: StyleSet },
    /// A footnote reference, by footnote id.
    FootnoteRef { id: String },
    /// A resolved hyperlink with its flattened display text.
    Hyperlink { url: String, text: String },
    /// An embedded image, by relationship id and media filename.
    Image { rel_id: String, filename: String },
}

#[derive(Debug)]
pub struct Paragraph {
    pub items: Vec<InlineItem>,
    /// Paragraph-level declarations (background shading).
    pub styles: StyleSet,
}

#[derive(Debug)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug)]
pub struct TableCell {
    pub paragraphs: Vec<Paragraph>,
}

/// Lookups resolved from the package parts, consulted while items are
/// coalesced into TEI.
#[derive(Debug, Default)]
pub struct LookupTables {
    /// Relationship id → hyperlink target URL.
    pub hyperlinks: HashMap<String, String>,
    /// Relationship id → media filename (basename under `word/media/`).
    pub images: HashMap<String, String>,
    /// Footnote id → flattened footnote text.
    pub footnotes: HashMap<String, String>,
}

/// Descriptive metadata from `docProps/core.xml`.
#[derive(Debug, Default)]
pub struct CoreProps {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub created: Option<String>,
    pub keywords: Option<String>,
    pub language: Option<String>,
}

pub struct MediaFile {
    pub filename: String,
    pub data: Vec<u8>,
}

pub struct DocxDocument {
    pub blocks: Vec<Block>,
    pub lookups: LookupTables,
    pub core_props: CoreProps,
    /// Footnote ids in `word/footnotes.xml` order, for the optional apparatus.
    pub footnote_order: Vec<String>,
    /// Media parts extracted from `word/media/`.
    pub media: Vec<MediaFile>,
}
