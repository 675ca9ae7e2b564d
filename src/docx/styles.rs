use std::collections::HashMap;
use std::io::{Read, Seek};

use crate::model::StyleSet;

use super::{WML_NS, parse_hex_color, read_zip_text, wml, wml_attr, wml_bool};

/// Tri-state run formatting, read either from a run's direct `w:rPr` or from
/// a named character style. `None` means "not specified here"; an explicit
/// `Some(false)` blocks a weaker source from turning the property on.
#[derive(Clone, Debug, Default)]
pub(super) struct RunProps {
    pub(super) color: Option<[u8; 3]>,
    pub(super) size_half_points: Option<u32>,
    pub(super) bold: Option<bool>,
    pub(super) italic: Option<bool>,
    pub(super) underline: Option<bool>,
    pub(super) superscript: Option<bool>,
    pub(super) subscript: Option<bool>,
}

pub(super) struct CharacterStyle {
    pub(super) props: RunProps,
    based_on: Option<String>,
}

pub(super) struct StylesInfo {
    pub(super) character_styles: HashMap<String, CharacterStyle>,
}

pub(super) fn parse_run_props(rpr: roxmltree::Node) -> RunProps {
    let color = wml_attr(rpr, "color").and_then(parse_hex_color);
    let size_half_points = wml_attr(rpr, "sz").and_then(|v| v.parse::<u32>().ok());
    let bold = wml_bool(rpr, "b");
    let italic = wml_bool(rpr, "i");
    let underline = wml(rpr, "u")
        .and_then(|n| n.attribute((WML_NS, "val")))
        .map(|v| v != "none");
    let (superscript, subscript) = match wml_attr(rpr, "vertAlign") {
        Some("superscript") => (Some(true), None),
        Some("subscript") => (None, Some(true)),
        Some("baseline") => (Some(false), Some(false)),
        _ => (None, None),
    };
    RunProps {
        color,
        size_half_points,
        bold,
        italic,
        underline,
        superscript,
        subscript,
    }
}

pub(super) fn parse_styles<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> StylesInfo {
    let mut character_styles = HashMap::new();

    let Some(xml_content) = read_zip_text(zip, "word/styles.xml") else {
        return StylesInfo { character_styles };
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        return StylesInfo { character_styles };
    };
    let root = xml.root_element();

    for style_node in root.children() {
        if style_node.tag_name().name() != "style"
            || style_node.tag_name().namespace() != Some(WML_NS)
        {
            continue;
        }
        if style_node.attribute((WML_NS, "type")) != Some("character") {
            continue;
        }
        let Some(style_id) = style_node.attribute((WML_NS, "styleId")) else {
            continue;
        };

        let props = wml(style_node, "rPr")
            .map(parse_run_props)
            .unwrap_or_default();
        let based_on = wml_attr(style_node, "basedOn").map(str::to_string);

        character_styles.insert(style_id.to_string(), CharacterStyle { props, based_on });
    }

    resolve_based_on(&mut character_styles);

    StylesInfo { character_styles }
}

fn resolve_based_on(styles: &mut HashMap<String, CharacterStyle>) {
    let ids: Vec<String> = styles.keys().cloned().collect();
    for id in ids {
        let mut chain: Vec<String> = Vec::new();
        let mut current = id.clone();
        loop {
            if chain.contains(&current) {
                break;
            }
            chain.push(current.clone());
            match styles.get(&current).and_then(|s| s.based_on.clone()) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Walk ancestors from furthest to closest, accumulating inherited
        // values. Each closer ancestor overrides the further one.
        macro_rules! inherit {
            ($field:ident, $inherited:expr, $s:expr) => {
                if $s.props.$field.is_some() {
                    $inherited.$field = $s.props.$field;
                }
            };
        }

        let mut inh = RunProps::default();
        for ancestor_id in chain.iter().rev() {
            if let Some(s) = styles.get(ancestor_id) {
                inherit!(color, inh, s);
                inherit!(size_half_points, inh, s);
                inherit!(bold, inh, s);
                inherit!(italic, inh, s);
                inherit!(underline, inh, s);
                inherit!(superscript, inh, s);
                inherit!(subscript, inh, s);
            }
        }

        if let Some(s) = styles.get_mut(&id) {
            let p = &mut s.props;
            p.color = p.color.or(inh.color);
            p.size_half_points = p.size_half_points.or(inh.size_half_points);
            p.bold = p.bold.or(inh.bold);
            p.italic = p.italic.or(inh.italic);
            p.underline = p.underline.or(inh.underline);
            p.superscript = p.superscript.or(inh.superscript);
            p.subscript = p.subscript.or(inh.subscript);
        }
    }
}

/// Resolve a run's declarations: each property falls back from the direct
/// `w:rPr` to the run's character style. Declarations come out in a fixed
/// order so identical formatting always yields the same attribute text.
pub(super) fn resolve_style(direct: &RunProps, named: Option<&RunProps>) -> StyleSet {
    let mut styles = StyleSet::new();

    if let Some([r, g, b]) = direct.color.or(named.and_then(|n| n.color)) {
        styles.push(format!("color: #{r:02X}{g:02X}{b:02X};"));
    }
    if let Some(hp) = direct
        .size_half_points
        .or(named.and_then(|n| n.size_half_points))
    {
        styles.push(format!("font-size: {:.1}pt;", hp as f32 / 2.0));
    }
    if direct.bold.or(named.and_then(|n| n.bold)).unwrap_or(false) {
        styles.push("font-weight: bold;");
    }
    if direct
        .italic
        .or(named.and_then(|n| n.italic))
        .unwrap_or(false)
    {
        styles.push("font-style: italic;");
    }
    if direct
        .underline
        .or(named.and_then(|n| n.underline))
        .unwrap_or(false)
    {
        styles.push("text-decoration: underline;");
    }
    if direct
        .superscript
        .or(named.and_then(|n| n.superscript))
        .unwrap_or(false)
    {
        styles.push("vertical-align: super; font-size: smaller;");
    }
    if direct
        .subscript
        .or(named.and_then(|n| n.subscript))
        .unwrap_or(false)
    {
        styles.push("vertical-align: sub; font-size: smaller;");
    }

    styles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(xml: &str) -> RunProps {
        let doc = roxmltree::Document::parse(xml).expect("parse rPr");
        parse_run_props(doc.root_element())
    }

    const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    #[test]
    fn direct_props_resolve_in_fixed_order() {
        let direct = props(&format!(
            r#"<w:rPr {W}><w:b/><w:i/><w:color w:val="1F4E79"/><w:sz w:val="23"/></w:rPr>"#
        ));
        let styles = resolve_style(&direct, None);
        assert_eq!(
            styles.as_attr(),
            "color: #1F4E79; font-size: 11.5pt; font-weight: bold; font-style: italic;"
        );
    }

    #[test]
    fn explicit_off_blocks_character_style() {
        let direct = props(&format!(r#"<w:rPr {W}><w:b w:val="0"/></w:rPr>"#));
        let named = props(&format!(r#"<w:rPr {W}><w:b/><w:i/></w:rPr>"#));
        let styles = resolve_style(&direct, Some(&named));
        assert_eq!(styles.as_attr(), "font-style: italic;");
    }

    #[test]
    fn auto_color_is_dropped() {
        let direct = props(&format!(r#"<w:rPr {W}><w:color w:val="auto"/></w:rPr>"#));
        assert!(resolve_style(&direct, None).is_empty());
    }

    #[test]
    fn vert_align_produces_combined_fragment() {
        let sup = props(&format!(
            r#"<w:rPr {W}><w:vertAlign w:val="superscript"/></w:rPr>"#
        ));
        assert_eq!(
            resolve_style(&sup, None).as_attr(),
            "vertical-align: super; font-size: smaller;"
        );

        let sub = props(&format!(
            r#"<w:rPr {W}><w:vertAlign w:val="subscript"/></w:rPr>"#
        ));
        assert_eq!(
            resolve_style(&sub, None).as_attr(),
            "vertical-align: sub; font-size: smaller;"
        );
    }

    #[test]
    fn baseline_blocks_inherited_vert_align() {
        let direct = props(&format!(
            r#"<w:rPr {W}><w:vertAlign w:val="baseline"/></w:rPr>"#
        ));
        let named = props(&format!(
            r#"<w:rPr {W}><w:vertAlign w:val="superscript"/></w:rPr>"#
        ));
        assert!(resolve_style(&direct, Some(&named)).is_empty());
    }

    #[test]
    fn underline_none_is_explicit_off() {
        let direct = props(&format!(r#"<w:rPr {W}><w:u w:val="none"/></w:rPr>"#));
        let named = props(&format!(r#"<w:rPr {W}><w:u w:val="single"/></w:rPr>"#));
        assert!(resolve_style(&direct, Some(&named)).is_empty());
    }

    #[test]
    fn based_on_chain_is_flattened() {
        let styles_xml = format!(
            r#"<w:styles {W}>
                 <w:style w:type="character" w:styleId="Base">
                   <w:rPr><w:b/><w:color w:val="FF0000"/></w:rPr>
                 </w:style>
                 <w:style w:type="character" w:styleId="Derived">
                   <w:basedOn w:val="Base"/>
                   <w:rPr><w:i/><w:color w:val="0000FF"/></w:rPr>
                 </w:style>
                 <w:style w:type="character" w:styleId="LoopA">
                   <w:basedOn w:val="LoopB"/>
                   <w:rPr><w:b/></w:rPr>
                 </w:style>
                 <w:style w:type="character" w:styleId="LoopB">
                   <w:basedOn w:val="LoopA"/>
                 </w:style>
               </w:styles>"#
        );
        let doc = roxmltree::Document::parse(&styles_xml).expect("parse styles");
        let mut character_styles = HashMap::new();
        for style_node in doc.root_element().children() {
            if style_node.tag_name().name() != "style" {
                continue;
            }
            let style_id = style_node
                .attribute((WML_NS, "styleId"))
                .expect("styleId")
                .to_string();
            let props = wml(style_node, "rPr")
                .map(parse_run_props)
                .unwrap_or_default();
            let based_on = wml_attr(style_node, "basedOn").map(str::to_string);
            character_styles.insert(style_id, CharacterStyle { props, based_on });
        }
        resolve_based_on(&mut character_styles);

        let derived = &character_styles["Derived"].props;
        assert_eq!(derived.bold, Some(true));
        assert_eq!(derived.italic, Some(true));
        assert_eq!(derived.color, Some([0, 0, 255]));

        // The cycle resolves without hanging and keeps its own properties.
        assert_eq!(character_styles["LoopA"].props.bold, Some(true));
    }
}
