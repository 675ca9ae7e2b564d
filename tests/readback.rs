use std::fs;
use std::path::PathBuf;

use teitok_convert::{readback_cas, readback_conllu, tei_to_cas, tei_to_conllu};

/// A tokenized document with morphosyntactic annotation in place.
const ANNOTATED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI>
<teiHeader><fileDesc/></teiHeader>
<text id="doc">
<s id="s-1"><tok id="w-1" lemma="the" upos="DET" head="w-2" deprel="det">The</tok> <tok id="w-2" lemma="cat" upos="NOUN" xpos="NN1" feats="Number=Sing" head="w-3" deprel="nsubj">cat</tok> <tok id="w-3" lemma="sleep" upos="VERB" deprel="root">sleeps</tok></s>
</text>
</TEI>"#;

/// The same document with every annotation stripped, as it would look
/// before an annotation pipeline has run.
const STRIPPED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI>
<teiHeader><fileDesc/></teiHeader>
<text id="doc">
<s id="s-1"><tok id="w-1">The</tok> <tok id="w-2">cat</tok> <tok id="w-3">sleeps</tok></s>
</text>
</TEI>"#;

fn write_files(dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
    let annotated = dir.path().join("annotated.xml");
    let stripped = dir.path().join("stripped.xml");
    fs::write(&annotated, ANNOTATED).expect("write annotated");
    fs::write(&stripped, STRIPPED).expect("write stripped");
    (annotated, stripped)
}

#[test]
fn conllu_annotations_survive_export_and_readback() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (annotated, stripped) = write_files(&dir);

    let conllu = tei_to_conllu(&annotated).expect("export");
    assert!(conllu.contains("# sent_id = s-1\n# text = The cat sleeps\n"));
    assert!(conllu.contains("2\tcat\tcat\tNOUN\tNN1\tNumber=Sing\t3\tnsubj\t_\ttokId=w-2\n"));
    assert!(conllu.contains("3\tsleeps\tsleep\tVERB\t_\t_\t0\troot\t_\ttokId=w-3\n"));

    let conllu_path = dir.path().join("doc.conllu");
    fs::write(&conllu_path, &conllu).expect("write conllu");

    let merged = readback_conllu(&stripped, &conllu_path, false).expect("readback");
    let out = String::from_utf8(merged).expect("utf8");

    assert!(out.contains(concat!(
        r#"<tok id="w-2" ord="2" lemma="cat" upos="NOUN" xpos="NN1" "#,
        r#"feats="Number=Sing" ohead="3" deprel="nsubj" misc="tokId=w-2" head="w-3">cat</tok>"#,
    )));
    assert!(out.contains(
        r#"<tok id="w-3" ord="3" lemma="sleep" upos="VERB" ohead="0" deprel="root" misc="tokId=w-3">sleeps</tok>"#
    ));
    // Everything outside the tok elements is carried through byte for byte.
    assert!(out.contains("<teiHeader><fileDesc/></teiHeader>"));
    assert!(out.contains(r#"<s id="s-1">"#));
}

#[test]
fn cas_annotations_survive_export_and_readback() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (annotated, stripped) = write_files(&dir);

    let xmi = tei_to_cas(&annotated).expect("export");
    assert!(xmi.contains(r#"sofaString="The cat sleeps""#));
    assert!(xmi.contains(r#"DependencyType="nsubj""#));

    let xmi_path = dir.path().join("doc.xmi");
    fs::write(&xmi_path, &xmi).expect("write xmi");

    let merged = readback_cas(&stripped, &xmi_path).expect("readback");
    let out = String::from_utf8(merged).expect("utf8");

    assert!(out.contains(
        r#"<tok id="w-1" upos="DET" lemma="the" deprel="det" head="w-2">The</tok>"#
    ));
    assert!(out.contains(concat!(
        r#"<tok id="w-2" upos="NOUN" xpos="NN1" lemma="cat" "#,
        r#"feats="Number=Sing" deprel="nsubj" head="w-3">cat</tok>"#,
    )));
    // No dependency was recorded for the root, so it keeps only its tags.
    assert!(out.contains(r#"<tok id="w-3" upos="VERB" lemma="sleep">sleeps</tok>"#));
}
