//! Visible preview tree: one bordered A4 sheet per page fragment.

use crate::dom::{element_at_mut, find_by_attr, find_by_class, parse_html, DomNode, ElementNode, Tag};
use crate::paginate::{Pages, BLOCK_ID_ATTR};
use crate::style::{EXPORT_MODE_CLASS, HIGHLIGHT_CLASS};

/// `id` of the preview root.
pub const PREVIEW_ROOT_ID: &str = "pdf-template";

/// Class of the element that holds a page's content.
pub const EDITOR_CLASS: &str = "ql-editor";

/// Build `div#pdf-template.space-y-4` with one sheet per page. The first
/// sheet shows `placeholder` when its fragment is empty.
pub fn build_preview(pages: &Pages, placeholder: &str) -> ElementNode {
    let mut root = ElementNode::with_class(Tag::Div, "space-y-4");
    root.set_attr("id", PREVIEW_ROOT_ID);

    for (index, fragment) in pages.pages.iter().enumerate() {
        let mut content = ElementNode::with_class(Tag::Div, "ql-container ql-editor");
        content.set_style_property("min-height", "200px");
        content.set_style_property("padding", "0");
        content.set_style_property("border", "none");
        content.children = if fragment.is_empty() {
            if index == 0 {
                vec![DomNode::Text(placeholder.to_string())]
            } else {
                Vec::new()
            }
        } else {
            parse_html(fragment)
        };

        let mut padding = ElementNode::with_class(Tag::Div, "p-8");
        padding.children.push(DomNode::Element(content));

        let mut sheet = ElementNode::with_class(Tag::Div, &format!("{EXPORT_MODE_CLASS} border"));
        sheet.children.push(DomNode::Element(padding));
        root.children.push(DomNode::Element(sheet));
    }
    root
}

/// Remove the highlight from every element. Returns how many were cleared.
pub fn clear_highlights(root: &mut ElementNode) -> usize {
    let mut cleared = 0;
    for path in find_by_class(root, HIGHLIGHT_CLASS) {
        if let Some(e) = element_at_mut(root, &path) {
            if e.remove_class(HIGHLIGHT_CLASS) {
                cleared += 1;
            }
        }
    }
    cleared
}

/// Highlight the element(s) carrying `block_id`, clearing any previous
/// highlight first. Returns how many elements were highlighted.
pub fn highlight_block(root: &mut ElementNode, block_id: &str) -> usize {
    clear_highlights(root);
    let paths = find_by_attr(root, BLOCK_ID_ATTR, block_id);
    for path in &paths {
        if let Some(e) = element_at_mut(root, path) {
            e.add_class(HIGHLIGHT_CLASS);
        }
    }
    paths.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::element_to_html;

    fn two_pages() -> Pages {
        Pages {
            pages: vec![
                r#"<p data-block-id="blk-0">a</p>"#.to_string(),
                r#"<p data-block-id="blk-1">b</p>"#.to_string(),
            ],
            count: 2,
        }
    }

    #[test]
    fn one_sheet_per_page() {
        let root = build_preview(&two_pages(), "Type here");
        assert_eq!(root.attr("id"), Some(PREVIEW_ROOT_ID));
        assert_eq!(root.children.len(), 2);
        assert_eq!(find_by_class(&root, EDITOR_CLASS).len(), 2);
        assert!(element_to_html(&root).contains(r#"<p data-block-id="blk-1">b</p>"#));
    }

    #[test]
    fn placeholder_on_first_empty_page() {
        let root = build_preview(&Pages::placeholder(), "Type here");
        assert_eq!(root.text_content(), "Type here");
    }

    #[test]
    fn highlight_moves_between_blocks() {
        let mut root = build_preview(&two_pages(), "");
        assert_eq!(highlight_block(&mut root, "blk-0"), 1);
        assert_eq!(highlight_block(&mut root, "blk-1"), 1);
        let highlighted = find_by_class(&root, HIGHLIGHT_CLASS);
        assert_eq!(highlighted.len(), 1);
        assert_eq!(clear_highlights(&mut root), 1);
        assert!(find_by_class(&root, HIGHLIGHT_CLASS).is_empty());
    }

    #[test]
    fn unknown_block_highlights_nothing() {
        let mut root = build_preview(&two_pages(), "");
        assert_eq!(highlight_block(&mut root, "blk-9"), 0);
    }
}
