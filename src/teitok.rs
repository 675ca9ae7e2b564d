use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::xml::{self, XmlEvent};

/// A token as read from a TEITOK document. `text` is the leading character
/// data only; annotation attributes stay in `attrs` under their TEI names.
#[derive(Clone, Debug)]
pub(crate) struct Token {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) attrs: HashMap<String, String>,
}

impl Token {
    /// Surface form: the `form` attribute when present, leading text otherwise.
    pub(crate) fn form(&self) -> &str {
        match self.attrs.get("form") {
            Some(form) => form,
            None => &self.text,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Sentence {
    pub(crate) id: String,
    pub(crate) tokens: Vec<Token>,
}

/// Read the sentence/token structure of a tokenized TEITOK document.
/// Matching is on local names, so both plain and namespaced TEI parse.
/// A sentence either contains its `tok` elements or points at them through
/// `sameAs` (stand-off segmentation); references resolve document-wide.
pub(crate) fn parse_sentences(xml_text: &str) -> Result<Vec<Sentence>> {
    let doc = roxmltree::Document::parse(xml_text)?;
    let root = doc.root_element();

    let text_nodes: Vec<roxmltree::Node> = root
        .descendants()
        .filter(|n| n.tag_name().name() == "text")
        .collect();

    let has_tok = text_nodes
        .iter()
        .any(|t| t.descendants().any(|n| n.tag_name().name() == "tok"));
    if !has_tok {
        return Err(Error::InvalidInput(
            "not a TEITOK XML file or not tokenized".into(),
        ));
    }

    let mut id_index: HashMap<&str, roxmltree::Node> = HashMap::new();
    for n in root.descendants() {
        if let Some(id) = n.attribute("id") {
            id_index.entry(id).or_insert(n);
        }
    }

    let mut sentences = Vec::new();
    let mut sent_count = 0;
    for t in &text_nodes {
        for s in t.descendants().filter(|n| n.tag_name().name() == "s") {
            sent_count += 1;
            let id = s
                .attribute("id")
                .map(str::to_string)
                .unwrap_or_else(|| format!("s-{sent_count}"));
            let mut tokens = Vec::new();
            if let Some(same_as) = s.attribute("sameAs") {
                for raw in same_as.split(' ') {
                    let ref_id = raw.strip_prefix('#').unwrap_or(raw);
                    match id_index.get(ref_id) {
                        Some(referenced) => push_token(*referenced, &mut tokens),
                        None => log::warn!("sameAs reference {raw} does not resolve"),
                    }
                }
            } else {
                for tok in s.descendants().filter(|n| n.tag_name().name() == "tok") {
                    push_token(tok, &mut tokens);
                }
            }
            sentences.push(Sentence { id, tokens });
        }
    }
    if sentences.is_empty() {
        return Err(Error::InvalidInput(
            "document is not segmented into sentences".into(),
        ));
    }
    Ok(sentences)
}

fn push_token(node: roxmltree::Node, out: &mut Vec<Token>) {
    let Some(id) = node.attribute("id") else {
        log::warn!("token without an id attribute");
        return;
    };
    let attrs = node
        .attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect();
    out.push(Token {
        id: id.to_string(),
        text: node.text().unwrap_or("").to_string(),
        attrs,
    });
}

/// Index every token under a `text` element by id, for annotation readback.
pub(crate) fn token_index(xml_text: &str) -> Result<HashMap<String, Token>> {
    let doc = roxmltree::Document::parse(xml_text)?;
    let root = doc.root_element();

    let mut index = HashMap::new();
    for t in root.descendants().filter(|n| n.tag_name().name() == "text") {
        for tok in t.descendants().filter(|n| n.tag_name().name() == "tok") {
            let Some(id) = tok.attribute("id") else {
                continue;
            };
            let attrs = tok
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect();
            index.insert(
                id.to_string(),
                Token {
                    id: id.to_string(),
                    text: tok.text().unwrap_or("").to_string(),
                    attrs,
                },
            );
        }
    }
    Ok(index)
}

/// Rewrite attributes on `tok` elements selected by id, leaving every other
/// byte of the document exactly as read. Update pairs apply in order, so a
/// later `head` lands after the column attributes it belongs with.
pub(crate) fn apply_token_updates(
    doc_bytes: &[u8],
    updates: &HashMap<String, Vec<(String, String)>>,
) -> Result<Vec<u8>> {
    let mut events = xml::parse_events(doc_bytes)?;
    for ev in events.iter_mut() {
        let id = match ev {
            XmlEvent::Start { name, attrs } | XmlEvent::Empty { name, attrs } => {
                if xml::local_name(name) != "tok" {
                    continue;
                }
                match xml::attr_value(attrs, "id") {
                    Some(id) => id.to_string(),
                    None => continue,
                }
            }
            _ => continue,
        };
        if let Some(pairs) = updates.get(&id) {
            for (key, value) in pairs {
                xml::set_attr(ev, key, value);
            }
        }
    }
    Ok(xml::write_events(&events))
}
