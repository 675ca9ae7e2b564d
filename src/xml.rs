use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::Result;

/// An XML element with lxml-style mixed content: `text` is the character data
/// before the first child, each child's `tail` is the character data after it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
    pub tail: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Element::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((name.into(), value.into()));
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Append character data at the trailing position: the tail of the last
    /// child when one exists, the element's own text otherwise.
    pub fn append_text(&mut self, s: &str) {
        match self.children.last_mut() {
            Some(last) => last.tail.push_str(s),
            None => self.text.push_str(s),
        }
    }

    /// True when the element carries neither text nor children. Attributes
    /// and tail do not count.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.children.is_empty()
    }

    /// Serialize just this element, verbatim, without a declaration.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, self, 0, false);
        out
    }

    fn preserves_space(&self) -> bool {
        self.attrs
            .iter()
            .any(|(k, v)| k == "xml:space" && v == "preserve")
    }
}

/// Serialize a document with an XML declaration. With `pretty`, children of
/// purely structural elements are indented; mixed content and anything inside
/// an `xml:space="preserve"` subtree is written verbatim so that tails keep
/// carrying the significant whitespace.
pub fn serialize(root: &Element, pretty: bool) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_element(&mut out, root, 0, pretty);
    out.push('\n');
    out
}

fn write_element(out: &mut String, el: &Element, depth: usize, format: bool) {
    out.push('<');
    out.push_str(&el.name);
    for (k, v) in &el.attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        escape_attr_into(out, v);
        out.push('"');
    }
    if el.text.is_empty() && el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    escape_text_into(out, &el.text);

    let mixed = !el.text.is_empty() || el.children.iter().any(|c| !c.tail.is_empty());
    let format_children = format && !mixed && !el.preserves_space();

    for child in &el.children {
        if format_children {
            out.push('\n');
            for _ in 0..depth + 1 {
                out.push_str("  ");
            }
        }
        write_element(out, child, depth + 1, format_children);
        escape_text_into(out, &child.tail);
    }
    if format_children && !el.children.is_empty() {
        out.push('\n');
        for _ in 0..depth {
            out.push_str("  ");
        }
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

pub(crate) fn escape_text_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

pub(crate) fn escape_attr_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// One event of a flat XML stream, used for edits that must leave every byte
/// the edit does not touch exactly as it was read.
#[derive(Clone, Debug)]
pub enum XmlEvent {
    Decl {
        version: String,
        encoding: Option<String>,
        standalone: Option<String>,
    },
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Empty {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
    CData {
        text: String,
    },
    Comment {
        text: String,
    },
    PI {
        content: String,
    },
    DocType {
        text: String,
    },
}

pub fn parse_events(xml_bytes: &[u8]) -> Result<Vec<XmlEvent>> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().trim_text(false);

    let mut events: Vec<XmlEvent> = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let ev = reader.read_event_into(&mut buf)?;
        match ev {
            Event::Eof => break,
            Event::Decl(d) => {
                let version = bytes_to_string(d.version()?);
                let encoding = d
                    .encoding()
                    .map(|r| r.map(bytes_to_string))
                    .transpose()
                    .unwrap_or(None);
                let standalone = d
                    .standalone()
                    .map(|r| r.map(bytes_to_string))
                    .transpose()
                    .unwrap_or(None);
                events.push(XmlEvent::Decl {
                    version,
                    encoding,
                    standalone,
                });
            }
            Event::Start(s) => {
                events.push(XmlEvent::Start {
                    name: bytes_to_string(s.name().as_ref()),
                    attrs: collect_attrs(&s)?,
                });
            }
            Event::End(e) => {
                events.push(XmlEvent::End {
                    name: bytes_to_string(e.name().as_ref()),
                });
            }
            Event::Empty(s) => {
                events.push(XmlEvent::Empty {
                    name: bytes_to_string(s.name().as_ref()),
                    attrs: collect_attrs(&s)?,
                });
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                events.push(XmlEvent::Text { text });
            }
            Event::CData(t) => {
                events.push(XmlEvent::CData {
                    text: bytes_to_string(t.into_inner()),
                });
            }
            Event::Comment(t) => {
                events.push(XmlEvent::Comment {
                    text: bytes_to_string(t.into_inner()),
                });
            }
            Event::PI(t) => {
                let target = bytes_to_string(t.target());
                let content = bytes_to_string(t.content());
                events.push(XmlEvent::PI {
                    content: format!("{target}{content}"),
                });
            }
            Event::DocType(t) => {
                events.push(XmlEvent::DocType {
                    text: bytes_to_string(t.into_inner()),
                });
            }
        }
    }
    Ok(events)
}

fn collect_attrs(s: &quick_xml::events::BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attrs: Vec<(String, String)> = Vec::new();
    for a in s.attributes() {
        let a = a.map_err(quick_xml::Error::from)?;
        let key = bytes_to_string(a.key.as_ref());
        // Keep raw (already-escaped) attribute bytes so writing the stream
        // back does not normalize character references in values we never
        // touched. Attribute-value normalization would turn an encoded
        // newline into a space.
        let val = bytes_to_string(a.value.as_ref());
        attrs.push((key, val));
    }
    Ok(attrs)
}

fn bytes_to_string(bytes: impl AsRef<[u8]>) -> String {
    String::from_utf8_lossy(bytes.as_ref()).into_owned()
}

pub fn write_events(events: &[XmlEvent]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();

    fn write_start_like(out: &mut Vec<u8>, name: &str, attrs: &[(String, String)], empty: bool) {
        out.extend_from_slice(b"<");
        out.extend_from_slice(name.as_bytes());
        // Attribute values are stored as raw (already-escaped) XML bytes.
        // Do NOT escape again.
        for (k, v) in attrs {
            out.extend_from_slice(b" ");
            out.extend_from_slice(k.as_bytes());
            out.extend_from_slice(b"=\"");
            out.extend_from_slice(v.as_bytes());
            out.extend_from_slice(b"\"");
        }
        if empty {
            out.extend_from_slice(b"/>");
        } else {
            out.extend_from_slice(b">");
        }
    }

    for ev in events {
        match ev {
            XmlEvent::Decl {
                version,
                encoding,
                standalone,
            } => {
                out.extend_from_slice(b"<?xml version=\"");
                out.extend_from_slice(version.as_bytes());
                out.extend_from_slice(b"\"");
                if let Some(e) = encoding {
                    out.extend_from_slice(b" encoding=\"");
                    out.extend_from_slice(e.as_bytes());
                    out.extend_from_slice(b"\"");
                }
                if let Some(s) = standalone {
                    out.extend_from_slice(b" standalone=\"");
                    out.extend_from_slice(s.as_bytes());
                    out.extend_from_slice(b"\"");
                }
                out.extend_from_slice(b"?>");
            }
            XmlEvent::Start { name, attrs } => {
                write_start_like(&mut out, name, attrs, false);
            }
            XmlEvent::End { name } => {
                out.extend_from_slice(b"</");
                out.extend_from_slice(name.as_bytes());
                out.extend_from_slice(b">");
            }
            XmlEvent::Empty { name, attrs } => {
                write_start_like(&mut out, name, attrs, true);
            }
            XmlEvent::Text { text } => {
                let mut buf = String::new();
                escape_text_into(&mut buf, text);
                out.extend_from_slice(buf.as_bytes());
            }
            XmlEvent::CData { text } => {
                // CDATA must remain unescaped.
                out.extend_from_slice(b"<![CDATA[");
                out.extend_from_slice(text.as_bytes());
                out.extend_from_slice(b"]]>");
            }
            XmlEvent::Comment { text } => {
                out.extend_from_slice(b"<!--");
                out.extend_from_slice(text.as_bytes());
                out.extend_from_slice(b"-->");
            }
            XmlEvent::PI { content } => {
                out.extend_from_slice(b"<?");
                out.extend_from_slice(content.as_bytes());
                out.extend_from_slice(b"?>");
            }
            XmlEvent::DocType { text } => {
                out.extend_from_slice(b"<!DOCTYPE");
                out.extend_from_slice(text.as_bytes());
                out.extend_from_slice(b">");
            }
        }
    }

    out
}

/// Replace the value of `key` on a start or empty-element event, appending
/// the attribute when it is not present. Other event kinds are left alone.
pub fn set_attr(ev: &mut XmlEvent, key: &str, value: &str) {
    let (XmlEvent::Start { attrs, .. } | XmlEvent::Empty { attrs, .. }) = ev else {
        return;
    };
    let mut escaped = String::new();
    escape_attr_into(&mut escaped, value);
    for (k, v) in attrs.iter_mut() {
        if k == key {
            *v = escaped;
            return;
        }
    }
    attrs.push((key.to_string(), escaped));
}

pub fn attr_value<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Element name with any namespace prefix stripped.
pub fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
