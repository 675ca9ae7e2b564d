use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::teitok::{self, Token};

/// CoNLL-U columns in file order, named as the TEI attributes they map to.
/// HEAD is kept as `ohead` (the sentence-local ordinal); the resolved token
/// id goes into `head` separately.
const CONCOLS: [&str; 10] = [
    "ord", "form", "lemma", "upos", "xpos", "feats", "ohead", "deprel", "dep", "misc",
];

/// Export a tokenized TEITOK document as CoNLL-U, one sentence per block.
pub fn tei_to_conllu(input: &Path) -> Result<String> {
    let xml_text = fs::read_to_string(input)?;
    let sentences = teitok::parse_sentences(&xml_text)?;
    Ok(export(&sentences))
}

/// Merge annotations from a CoNLL-U file back into the TEITOK document,
/// touching nothing but `tok` attributes. `join` controls whether
/// `SpaceAfter=No` becomes `join="right"`.
pub fn readback_conllu(tei_path: &Path, conllu_path: &Path, join: bool) -> Result<Vec<u8>> {
    let tei_text = fs::read_to_string(tei_path)?;
    let conllu_text = fs::read_to_string(conllu_path)?;
    merge(&tei_text, &conllu_text, join)
}

fn export(sentences: &[teitok::Sentence]) -> String {
    let mut out = String::new();
    for sentence in sentences {
        // Sentence-local ordinals, used both as the ID column and for HEAD.
        let mut ords: HashMap<&str, String> = HashMap::new();
        for (i, tok) in sentence.tokens.iter().enumerate() {
            let ord = match tok.attrs.get("ord") {
                Some(ord) => ord.clone(),
                None => (i + 1).to_string(),
            };
            ords.insert(tok.id.as_str(), ord);
        }

        let _ = writeln!(out, "# sent_id = {}", sentence.id);
        let _ = writeln!(out, "# text = {}", detokenize(&sentence.tokens));
        for tok in &sentence.tokens {
            let head = match tok.attrs.get("head") {
                None => "0".to_string(),
                Some(head_id) => match ords.get(head_id.as_str()) {
                    Some(ord) => ord.clone(),
                    None => {
                        log::warn!(
                            "head {head_id} of {} does not resolve within sentence {}",
                            tok.id,
                            sentence.id
                        );
                        "_".to_string()
                    }
                },
            };

            let join_right = tok.attrs.get("join").is_some_and(|j| j == "right");
            let mut misc = match tok.attrs.get("misc") {
                Some(misc) => misc.clone(),
                None => format!("tokId={}", tok.id),
            };
            if join_right && !misc.split('|').any(|f| f == "SpaceAfter=No") {
                misc.push_str("|SpaceAfter=No");
            }

            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                ords[tok.id.as_str()],
                tok.form(),
                col(tok, "lemma"),
                col(tok, "upos"),
                col(tok, "xpos"),
                col(tok, "feats"),
                head,
                col(tok, "deprel"),
                col(tok, "dep"),
                misc,
            );
        }
        out.push('\n');
    }
    out
}

fn col<'a>(tok: &'a Token, name: &str) -> &'a str {
    tok.attrs.get(name).map_or("_", String::as_str)
}

fn detokenize(tokens: &[Token]) -> String {
    let mut text = String::new();
    for (i, tok) in tokens.iter().enumerate() {
        text.push_str(tok.form());
        let join_right = tok.attrs.get("join").is_some_and(|j| j == "right");
        if i + 1 < tokens.len() && !join_right {
            text.push(' ');
        }
    }
    text
}

fn merge(tei_text: &str, conllu_text: &str, join: bool) -> Result<Vec<u8>> {
    let toks = teitok::token_index(tei_text)?;

    let mut updates: HashMap<String, Vec<(String, String)>> = HashMap::new();
    // (token id, ohead from the current line when its fields were applied)
    let mut pending: Vec<(String, Option<String>)> = Vec::new();
    let mut ord2id: HashMap<String, String> = HashMap::new();

    for line in conllu_text.lines() {
        if line.is_empty() {
            flush_sentence(&toks, &mut updates, &mut pending, &mut ord2id);
        } else if line.starts_with('#') {
            continue;
        } else {
            read_token_line(line, &toks, &mut updates, &mut pending, &mut ord2id, join);
        }
    }
    // A file without a trailing blank line still resolves its last sentence.
    flush_sentence(&toks, &mut updates, &mut pending, &mut ord2id);

    teitok::apply_token_updates(tei_text.as_bytes(), &updates)
}

fn read_token_line(
    line: &str,
    toks: &HashMap<String, Token>,
    updates: &mut HashMap<String, Vec<(String, String)>>,
    pending: &mut Vec<(String, Option<String>)>,
    ord2id: &mut HashMap<String, String>,
    join: bool,
) {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 10 {
        log::debug!("skipping short token line: {line}");
        return;
    }

    let mut tokid = "";
    let mut space_after_no = false;
    for mf in fields[9].split('|') {
        if let Some(rest) = mf.strip_prefix("tokId=") {
            tokid = rest;
        } else if let Some(rest) = mf.strip_prefix("tok_id=") {
            tokid = rest;
        } else if mf == "SpaceAfter=No" {
            space_after_no = true;
        } else if !mf.contains('=') {
            tokid = mf;
        }
    }
    if tokid.is_empty() {
        log::debug!("skipping token line without a token id: {line}");
        return;
    }
    let Some(tok) = toks.get(tokid) else {
        log::warn!("token {tokid} is not in the TEI document");
        return;
    };

    // The ordinal maps register even when verification fails below, so
    // other tokens in the sentence can still resolve their heads.
    let cform = fields[1];
    let xform = tok.form();
    let verified = cform == xform;
    let line_ohead = match fields[6] {
        _ if !verified => None,
        "" | "_" => None,
        v => Some(v.to_string()),
    };
    pending.push((tokid.to_string(), line_ohead));
    ord2id.insert(fields[0].to_string(), tokid.to_string());

    if !verified {
        log::warn!(
            "verification mismatch: {tokid} is {cform:?} in the CoNLL-U file but {xform:?} in the document"
        );
        return;
    }

    let pairs = updates.entry(tokid.to_string()).or_default();
    if space_after_no && join {
        pairs.push(("join".into(), "right".into()));
    }
    for (cc, name) in CONCOLS.iter().enumerate() {
        let value = fields[cc];
        if *name == "form" || value.is_empty() || value == "_" {
            continue;
        }
        pairs.push(((*name).to_string(), value.to_string()));
    }
}

/// End of sentence: resolve each pending token's ordinal head into a token
/// id. An `ohead` can come from the line just read or from an attribute
/// already on the token; `0` marks the root and stays headless.
fn flush_sentence(
    toks: &HashMap<String, Token>,
    updates: &mut HashMap<String, Vec<(String, String)>>,
    pending: &mut Vec<(String, Option<String>)>,
    ord2id: &mut HashMap<String, String>,
) {
    for (tokid, line_ohead) in pending.drain(..) {
        let ohead = match line_ohead {
            Some(v) => v,
            None => match toks.get(&tokid).and_then(|t| t.attrs.get("ohead")) {
                Some(v) => v.clone(),
                None => continue,
            },
        };
        match ord2id.get(&ohead) {
            Some(head_id) => {
                updates
                    .entry(tokid)
                    .or_default()
                    .push(("head".into(), head_id.clone()));
            }
            None => {
                if ohead != "0" {
                    log::warn!("ohead {ohead} of {tokid} not found in the sentence");
                }
            }
        }
    }
    ord2id.clear();
}
