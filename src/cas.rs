use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::teitok::{self, Sentence};
use crate::xml;

const XMI_NS: &str = "http://www.omg.org/XMI";
const CAS_NS: &str = "http:///uima/cas.ecore";
const SEG_NS: &str = "http:///de/tudarmstadt/ukp/dkpro/core/api/segmentation/type.ecore";
const POS_NS: &str = "http:///de/tudarmstadt/ukp/dkpro/core/api/lexmorph/type/pos.ecore";
const MORPH_NS: &str = "http:///de/tudarmstadt/ukp/dkpro/core/api/lexmorph/type/morph.ecore";
const DEP_NS: &str = "http:///de/tudarmstadt/ukp/dkpro/core/api/syntax/type/dependency.ecore";

/// Convert a tokenized TEITOK document into a UIMA CAS XMI serialization
/// using the DKPro segmentation/lexmorph/dependency type system.
pub fn tei_to_cas(input: &Path) -> Result<String> {
    let xml_text = fs::read_to_string(input)?;
    let sentences = teitok::parse_sentences(&xml_text)?;
    Ok(build_xmi(&sentences))
}

/// Merge token-level annotations from a CAS XMI file back into the TEITOK
/// document, touching nothing but `tok` attributes.
pub fn readback_cas(tei_path: &Path, xmi_path: &Path) -> Result<Vec<u8>> {
    let tei_text = fs::read_to_string(tei_path)?;
    let xmi_text = fs::read_to_string(xmi_path)?;

    let known = teitok::token_index(&tei_text)?;
    let mut updates = collect_updates(&xmi_text)?;
    updates.retain(|id, _| {
        let present = known.contains_key(id);
        if !present {
            log::warn!("token {id} from the CAS is not in the TEI document");
        }
        present
    });

    teitok::apply_token_updates(tei_text.as_bytes(), &updates)
}

/// Tokens are space-joined into the sofa string; offsets count characters.
/// Every annotation gets a sequential `xmi:id` (0 is the null FS, 1 the
/// sofa) and is listed in the closing view.
fn build_xmi(sentences: &[Sentence]) -> String {
    let mut sofa = String::new();
    let mut body = String::new();
    let mut members: Vec<u32> = Vec::new();
    let mut next_id: u32 = 2;
    // token id -> (xmi id, begin, end)
    let mut spans: HashMap<&str, (u32, i64, i64)> = HashMap::new();
    // (governor token, head token, relation), resolved once all tokens exist
    let mut relations: Vec<(&str, &str, &str)> = Vec::new();

    let mut end: i64 = -1;
    let mut first = true;
    for sentence in sentences {
        let sent_begin = end + 1;
        for tok in &sentence.tokens {
            let begin = end + 1;
            end = begin + tok.text.chars().count() as i64;
            if first {
                first = false;
            } else {
                sofa.push(' ');
            }
            sofa.push_str(&tok.text);

            let mut refs = String::new();
            let upos = tok.attrs.get("upos");
            let xpos = tok.attrs.get("xpos");
            if upos.is_some() || xpos.is_some() {
                let id = alloc(&mut next_id, &mut members);
                let _ = writeln!(
                    body,
                    r#"  <pos:POS xmi:id="{id}" sofa="1" begin="{begin}" end="{end}" coarseValue="{}" PosValue="{}"/>"#,
                    esc(upos.map_or("", String::as_str)),
                    esc(xpos.map_or("", String::as_str)),
                );
                let _ = write!(refs, r#" pos="{id}""#);
            }
            if let Some(lemma) = tok.attrs.get("lemma") {
                let id = alloc(&mut next_id, &mut members);
                let _ = writeln!(
                    body,
                    r#"  <type:Lemma xmi:id="{id}" sofa="1" begin="{begin}" end="{end}" value="{}"/>"#,
                    esc(lemma),
                );
                let _ = write!(refs, r#" lemma="{id}""#);
            }
            if let Some(feats) = tok.attrs.get("feats") {
                let id = alloc(&mut next_id, &mut members);
                let _ = writeln!(
                    body,
                    r#"  <morph:MorphologicalFeatures xmi:id="{id}" sofa="1" begin="{begin}" end="{end}" value="{}"/>"#,
                    esc(feats),
                );
                let _ = write!(refs, r#" morph="{id}""#);
            }

            let id = alloc(&mut next_id, &mut members);
            let _ = writeln!(
                body,
                r#"  <type:Token xmi:id="{id}" sofa="1" begin="{begin}" end="{end}" id="{}"{refs}/>"#,
                esc(&tok.id),
            );
            spans.insert(tok.id.as_str(), (id, begin, end));

            if let Some(head) = tok.attrs.get("head")
                && let Some(deprel) = tok.attrs.get("deprel")
            {
                relations.push((tok.id.as_str(), head.as_str(), deprel.as_str()));
            }
        }
        if end > sent_begin {
            let id = alloc(&mut next_id, &mut members);
            let _ = writeln!(
                body,
                r#"  <type:Sentence xmi:id="{id}" sofa="1" begin="{sent_begin}" end="{end}" id="{}"/>"#,
                esc(&sentence.id),
            );
        }
    }

    for (gov, head, deprel) in relations {
        let Some(&(gov_id, _, _)) = spans.get(gov) else {
            continue;
        };
        let Some(&(head_id, head_begin, head_end)) = spans.get(head) else {
            log::warn!("dependency head {head} does not resolve to a token");
            continue;
        };
        let id = alloc(&mut next_id, &mut members);
        let _ = writeln!(
            body,
            r#"  <dependency:Dependency xmi:id="{id}" sofa="1" begin="{head_begin}" end="{head_end}" Governor="{gov_id}" Dependent="{head_id}" DependencyType="{}" flavor="basic"/>"#,
            esc(deprel),
        );
    }

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        r#"<xmi:XMI xmlns:xmi="{XMI_NS}" xmlns:cas="{CAS_NS}" xmlns:type="{SEG_NS}" xmlns:pos="{POS_NS}" xmlns:morph="{MORPH_NS}" xmlns:dependency="{DEP_NS}" xmi:version="2.0">"#,
    );
    out.push_str("  <cas:NULL xmi:id=\"0\"/>\n");
    let _ = writeln!(
        out,
        r#"  <cas:Sofa xmi:id="1" sofaNum="1" sofaID="_InitialView" mimeType="text" sofaString="{}"/>"#,
        esc(&sofa),
    );
    out.push_str(&body);
    let members = members
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, r#"  <cas:View sofa="1" members="{members}"/>"#);
    out.push_str("</xmi:XMI>\n");
    out
}

fn alloc(next_id: &mut u32, members: &mut Vec<u32>) -> u32 {
    let id = *next_id;
    *next_id += 1;
    members.push(id);
    id
}

fn esc(value: &str) -> String {
    let mut out = String::new();
    xml::escape_attr_into(&mut out, value);
    out
}

/// Walk the XMI feature structures and turn them into per-token attribute
/// updates: `pos`/`lemma`/`morph` references on Token FSes, plus `deprel`
/// and `head` from Dependency FSes (written onto the governor).
fn collect_updates(xmi_text: &str) -> Result<HashMap<String, Vec<(String, String)>>> {
    let doc = roxmltree::Document::parse(xmi_text)?;
    let root = doc.root_element();

    let mut by_xmi_id: HashMap<&str, roxmltree::Node> = HashMap::new();
    for n in root.children().filter(|n| n.is_element()) {
        if let Some(id) = n.attribute((XMI_NS, "id")) {
            by_xmi_id.insert(id, n);
        }
    }

    let mut updates: HashMap<String, Vec<(String, String)>> = HashMap::new();

    for token in root.children().filter(|n| is_fs(n, SEG_NS, "Token")) {
        let Some(tok_id) = token.attribute("id") else {
            log::warn!("Token feature structure without an id");
            continue;
        };
        let pairs = updates.entry(tok_id.to_string()).or_default();
        if let Some(pos) = resolve_ref(&by_xmi_id, token, "pos") {
            if let Some(upos) = pos.attribute("coarseValue")
                && !upos.is_empty()
            {
                pairs.push(("upos".into(), upos.into()));
            }
            if let Some(xpos) = pos.attribute("PosValue")
                && !xpos.is_empty()
            {
                pairs.push(("xpos".into(), xpos.into()));
            }
        }
        if let Some(lemma) = resolve_ref(&by_xmi_id, token, "lemma")
            && let Some(value) = lemma.attribute("value")
        {
            pairs.push(("lemma".into(), value.into()));
        }
        if let Some(morph) = resolve_ref(&by_xmi_id, token, "morph")
            && let Some(value) = morph.attribute("value")
        {
            pairs.push(("feats".into(), value.into()));
        }
    }

    for dep in root.children().filter(|n| is_fs(n, DEP_NS, "Dependency")) {
        let governor = resolve_ref(&by_xmi_id, dep, "Governor").and_then(|n| n.attribute("id"));
        let dependent = resolve_ref(&by_xmi_id, dep, "Dependent").and_then(|n| n.attribute("id"));
        let (Some(governor), Some(dependent)) = (governor, dependent) else {
            log::warn!("dependency with an unresolvable governor or dependent");
            continue;
        };
        let Some(deprel) = dep.attribute("DependencyType") else {
            log::warn!("dependency without a DependencyType");
            continue;
        };
        let pairs = updates.entry(governor.to_string()).or_default();
        pairs.push(("deprel".into(), deprel.into()));
        pairs.push(("head".into(), dependent.into()));
    }

    Ok(updates)
}

fn is_fs(n: &roxmltree::Node, ns: &str, name: &str) -> bool {
    n.is_element() && n.tag_name().name() == name && n.tag_name().namespace() == Some(ns)
}

fn resolve_ref<'a>(
    by_xmi_id: &HashMap<&str, roxmltree::Node<'a, 'a>>,
    fs: roxmltree::Node,
    feature: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    by_xmi_id.get(fs.attribute(feature)?).copied()
}
