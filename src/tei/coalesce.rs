use crate::model::{InlineItem, LookupTables, Paragraph, StyleSet};
use crate::xml::Element;

/// Where the next mergeable content lands: the paragraph itself, or the
/// currently open `hi` (always the paragraph's last child).
enum MergeTarget {
    Para,
    Highlight(StyleSet),
}

/// Fold a paragraph's inline items into a TEI `p`, merging adjacent
/// same-styled text into one `hi` and resolving footnote, hyperlink and
/// image references.
///
/// Unstyled text goes to the paragraph's trailing position and closes any
/// open `hi`. A resolved hyperlink becomes a `ref` at paragraph level and
/// also closes the open `hi`; notes and figures nest inside the current
/// target without closing it, so text on both sides of them still merges.
pub(super) fn coalesce(para: Paragraph, lookups: &LookupTables, image_reldir: &str) -> Element {
    let mut p = Element::new("p");
    if !para.styles.is_empty() {
        p.set_attr("style", para.styles.as_attr());
    }
    p.tail = "\n".into();

    let mut target = MergeTarget::Para;
    for item in para.items {
        match item {
            InlineItem::StyledText { text, styles } => {
                if styles.is_empty() {
                    p.append_text(&text);
                    target = MergeTarget::Para;
                } else if let MergeTarget::Highlight(open) = &target
                    && *open == styles
                {
                    if let Some(hi) = p.children.last_mut() {
                        hi.append_text(&text);
                    }
                } else {
                    let hi = Element::new("hi")
                        .attr("style", styles.as_attr())
                        .with_text(text);
                    p.children.push(hi);
                    target = MergeTarget::Highlight(styles);
                }
            }
            InlineItem::FootnoteRef { id } => match lookups.footnotes.get(&id) {
                Some(note_text) => {
                    let note = Element::new("note")
                        .attr("id", format!("fn-{id}"))
                        .with_text(note_text.clone());
                    push_to_target(&mut p, &target, note);
                }
                None => log::warn!("dropping footnote reference with unknown id {id}"),
            },
            InlineItem::Hyperlink { url, text } => {
                let reference = Element::new("ref").attr("target", url).with_text(text);
                p.children.push(reference);
                target = MergeTarget::Para;
            }
            InlineItem::Image { rel_id, filename } => {
                let mut figure = Element::new("figure").attr("id", rel_id);
                figure.children.push(
                    Element::new("graphic").attr("url", format!("{image_reldir}/{filename}")),
                );
                push_to_target(&mut p, &target, figure);
            }
        }
    }
    p
}

fn push_to_target(p: &mut Element, target: &MergeTarget, child: Element) {
    if let MergeTarget::Highlight(_) = target
        && let Some(hi) = p.children.last_mut()
    {
        hi.children.push(child);
        return;
    }
    p.children.push(child);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(text: &str, decls: &[&str]) -> InlineItem {
        let mut styles = StyleSet::new();
        for d in decls {
            styles.push(*d);
        }
        InlineItem::StyledText {
            text: text.into(),
            styles,
        }
    }

    fn plain(text: &str) -> InlineItem {
        styled(text, &[])
    }

    fn para(items: Vec<InlineItem>) -> Paragraph {
        Paragraph {
            items,
            styles: StyleSet::new(),
        }
    }

    fn lookups() -> LookupTables {
        let mut l = LookupTables::default();
        l.footnotes.insert("3".into(), "Bottom text.".into());
        l
    }

    fn run(items: Vec<InlineItem>) -> String {
        coalesce(para(items), &lookups(), "doc_files").to_xml()
    }

    #[test]
    fn adjacent_same_style_runs_merge() {
        let out = run(vec![
            styled("bold", &["font-weight: bold;"]),
            styled(" and more", &["font-weight: bold;"]),
        ]);
        assert_eq!(
            out,
            r#"<p><hi style="font-weight: bold;">bold and more</hi></p>"#
        );
    }

    #[test]
    fn style_order_does_not_block_merging() {
        let out = run(vec![
            styled("a", &["font-weight: bold;", "font-style: italic;"]),
            styled("b", &["font-style: italic;", "font-weight: bold;"]),
        ]);
        assert_eq!(
            out,
            r#"<p><hi style="font-weight: bold; font-style: italic;">ab</hi></p>"#
        );
    }

    #[test]
    fn different_styles_open_new_highlight() {
        let out = run(vec![
            styled("bold", &["font-weight: bold;"]),
            styled("italic", &["font-style: italic;"]),
        ]);
        assert_eq!(
            out,
            r#"<p><hi style="font-weight: bold;">bold</hi><hi style="font-style: italic;">italic</hi></p>"#
        );
    }

    #[test]
    fn unstyled_text_lands_after_open_highlight() {
        let out = run(vec![
            plain("start "),
            styled("bold", &["font-weight: bold;"]),
            plain(" end"),
        ]);
        assert_eq!(
            out,
            r#"<p>start <hi style="font-weight: bold;">bold</hi> end</p>"#
        );
    }

    #[test]
    fn unstyled_text_closes_highlight() {
        let out = run(vec![
            styled("a", &["font-weight: bold;"]),
            plain(" mid "),
            styled("b", &["font-weight: bold;"]),
        ]);
        assert_eq!(
            out,
            r#"<p><hi style="font-weight: bold;">a</hi> mid <hi style="font-weight: bold;">b</hi></p>"#
        );
    }

    #[test]
    fn resolved_footnote_nests_in_open_highlight() {
        let out = run(vec![
            styled("before", &["font-weight: bold;"]),
            InlineItem::FootnoteRef { id: "3".into() },
            styled(" after", &["font-weight: bold;"]),
        ]);
        assert_eq!(
            out,
            r#"<p><hi style="font-weight: bold;">before<note id="fn-3">Bottom text.</note> after</hi></p>"#
        );
    }

    #[test]
    fn footnote_at_paragraph_level() {
        let out = run(vec![plain("text"), InlineItem::FootnoteRef { id: "3".into() }]);
        assert_eq!(out, r#"<p>text<note id="fn-3">Bottom text.</note></p>"#);
    }

    #[test]
    fn unknown_footnote_is_dropped() {
        let out = run(vec![plain("text"), InlineItem::FootnoteRef { id: "9".into() }]);
        assert_eq!(out, r#"<p>text</p>"#);
    }

    #[test]
    fn hyperlink_closes_highlight_and_sits_at_paragraph_level() {
        let out = run(vec![
            styled("a", &["font-weight: bold;"]),
            InlineItem::Hyperlink {
                url: "https://example.com/".into(),
                text: "link".into(),
            },
            styled("b", &["font-weight: bold;"]),
        ]);
        assert_eq!(
            out,
            r#"<p><hi style="font-weight: bold;">a</hi><ref target="https://example.com/">link</ref><hi style="font-weight: bold;">b</hi></p>"#
        );
    }

    #[test]
    fn figure_nests_in_open_highlight_and_keeps_it_open() {
        let out = run(vec![
            styled("fig", &["font-style: italic;"]),
            InlineItem::Image {
                rel_id: "rId7".into(),
                filename: "image1.png".into(),
            },
            styled(" caption", &["font-style: italic;"]),
        ]);
        assert_eq!(
            out,
            r#"<p><hi style="font-style: italic;">fig<figure id="rId7"><graphic url="doc_files/image1.png"/></figure> caption</hi></p>"#
        );
    }

    #[test]
    fn figure_at_paragraph_level_uses_reldir() {
        let out = run(vec![InlineItem::Image {
            rel_id: "rId7".into(),
            filename: "image1.png".into(),
        }]);
        assert_eq!(
            out,
            r#"<p><figure id="rId7"><graphic url="doc_files/image1.png"/></figure></p>"#
        );
    }

    #[test]
    fn paragraph_background_becomes_style_attr() {
        let mut styles = StyleSet::new();
        styles.push("background-color: #DDEEFF;");
        let p = coalesce(
            Paragraph {
                items: vec![plain("x")],
                styles,
            },
            &lookups(),
            "doc_files",
        );
        assert_eq!(
            p.to_xml(),
            r#"<p style="background-color: #DDEEFF;">x</p>"#
        );
    }

    #[test]
    fn empty_result_is_detectable() {
        let p = coalesce(para(vec![]), &lookups(), "doc_files");
        assert!(p.is_empty());

        // A paragraph whose only item was an unresolvable reference also
        // comes out empty.
        let p = coalesce(
            para(vec![InlineItem::FootnoteRef { id: "9".into() }]),
            &lookups(),
            "doc_files",
        );
        assert!(p.is_empty());
    }

    #[test]
    fn text_around_note_keeps_merging_into_same_highlight() {
        // note + merged text ends up as: hi[text, note(tail=" tail")]
        let out = run(vec![
            styled("x", &["font-weight: bold;"]),
            InlineItem::FootnoteRef { id: "3".into() },
            styled(" y", &["font-weight: bold;"]),
            styled(" z", &["font-weight: bold;"]),
        ]);
        assert_eq!(
            out,
            r#"<p><hi style="font-weight: bold;">x<note id="fn-3">Bottom text.</note> y z</hi></p>"#
        );
    }
}
