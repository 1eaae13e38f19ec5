//! Pagination – splits editor markup into A4 page fragments.
//!
//! Top-level nodes are tagged with `data-block-id`, then appended one at a
//! time to an accumulator that is measured on a [`MeasurementSurface`]. When
//! the accumulator overflows the budget, the last block moves to a fresh
//! page. A block that overflows on its own keeps a page to itself.

use serde::{Deserialize, Serialize};

use crate::dom::{body_children, parse_html, to_html, DomNode, ElementNode};
use crate::measure::{Measure, MeasurementSurface};
use crate::units::{mm_to_px, A4_HEIGHT_MM};

/// Attribute carrying the per-pass block identifier.
pub const BLOCK_ID_ATTR: &str = "data-block-id";

/// Page-height budget for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageBudget {
    /// The whole document on one page; nothing is measured.
    #[default]
    Unbounded,
    /// Maximum rendered height per page, in CSS px.
    Finite(f32),
}

impl PageBudget {
    /// A4 sheet height minus top and bottom margins, in CSS px.
    pub fn a4_content(margin_mm: f32) -> Self {
        PageBudget::Finite(mm_to_px(A4_HEIGHT_MM).round() - 2.0 * mm_to_px(margin_mm))
    }
}

/// Ordered page fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pages {
    pub pages: Vec<String>,
    pub count: usize,
}

impl Pages {
    /// One empty page, shown with the placeholder text.
    pub fn placeholder() -> Self {
        Self::from_fragments(vec![String::new()])
    }

    fn from_fragments(pages: Vec<String>) -> Self {
        let count = pages.len();
        Self { pages, count }
    }

    /// True when the only page is the empty placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.count == 1 && self.pages[0].is_empty()
    }
}

impl Default for Pages {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Parse markup into top-level blocks, dropping whitespace-only text.
fn top_level_blocks(markup: &str) -> Vec<DomNode> {
    body_children(&parse_html(markup))
        .into_iter()
        .filter(|n| !matches!(n, DomNode::Text(t) if t.trim().is_empty()))
        .collect()
}

/// Assign `blk-N` ids in document order. List containers hand their id
/// slots to their items.
fn assign_block_ids(blocks: &mut [DomNode]) {
    let mut next = 0usize;
    let mut tag = |e: &mut ElementNode| {
        e.set_attr(BLOCK_ID_ATTR, &format!("blk-{next}"));
        next += 1;
    };
    for block in blocks.iter_mut() {
        let DomNode::Element(e) = block else {
            continue;
        };
        if e.tag.is_list() {
            for item in e.children.iter_mut().filter_map(DomNode::as_element_mut) {
                tag(item);
            }
        } else {
            tag(e);
        }
    }
}

/// Split `markup` into pages.
///
/// `width` is the measurement surface width in CSS px (the page width).
/// Measurement failures never propagate: the pages finished so far are kept
/// and every block not yet placed goes onto one final page.
pub fn paginate<M: Measure + ?Sized>(markup: &str, width: f32, budget: PageBudget, measurer: &mut M) -> Pages {
    let mut blocks = top_level_blocks(markup);
    if blocks.is_empty() {
        return Pages::placeholder();
    }
    assign_block_ids(&mut blocks);

    let limit = match budget {
        PageBudget::Unbounded => {
            log::debug!("Unbounded budget: {} blocks on one page", blocks.len());
            return Pages::from_fragments(vec![to_html(&blocks)]);
        }
        PageBudget::Finite(limit) => limit,
    };

    let mut surface = match MeasurementSurface::open(measurer, width) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Could not open measurement surface, keeping one page: {e}");
            return Pages::from_fragments(vec![to_html(&blocks)]);
        }
    };

    let mut pages = Vec::new();
    let mut acc: Vec<DomNode> = Vec::new();

    for (i, block) in blocks.iter().enumerate() {
        acc.push(block.clone());
        match surface.measure(&to_html(&acc)) {
            Ok(height) if height > limit && acc.len() > 1 => {
                let overflow = acc.pop();
                log::debug!(
                    "Page {} closed with {} blocks ({height:.1}px > {limit:.1}px)",
                    pages.len() + 1,
                    acc.len()
                );
                pages.push(to_html(&acc));
                acc = overflow.into_iter().collect();
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!(
                    "Measurement failed at block {i}, placing {} remaining blocks on a final page: {e}",
                    blocks.len() - i
                );
                acc.extend(blocks[i + 1..].iter().cloned());
                break;
            }
        }
    }
    pages.push(to_html(&acc));
    drop(surface);

    log::debug!("Paginated {} blocks into {} pages", blocks.len(), pages.len());
    Pages::from_fragments(pages)
}

fn strip_ids(nodes: &mut [DomNode]) {
    for node in nodes {
        if let DomNode::Element(e) = node {
            e.remove_attr(BLOCK_ID_ATTR);
            strip_ids(&mut e.children);
        }
    }
}

/// Remove tracking identifiers from a fragment (normalizing it on the way).
pub fn strip_block_ids(fragment: &str) -> String {
    let mut nodes = parse_html(fragment);
    strip_ids(&mut nodes);
    to_html(&nodes)
}

/// Block identifiers present in a fragment, in document order.
pub fn block_ids(fragment: &str) -> Vec<String> {
    fn collect(nodes: &[DomNode], out: &mut Vec<String>) {
        for e in nodes.iter().filter_map(DomNode::as_element) {
            if let Some(id) = e.attr(BLOCK_ID_ATTR) {
                out.push(id.to_string());
            }
            collect(&e.children, out);
        }
    }
    let mut out = Vec::new();
    collect(&parse_html(fragment), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};

    /// Each block is 100px tall.
    struct PerBlock;

    impl Measure for PerBlock {
        fn measure(&mut self, markup: &str, _width: f32) -> Result<f32> {
            Ok(parse_html(markup).len() as f32 * 100.0)
        }
    }

    struct Broken;

    impl Measure for Broken {
        fn measure(&mut self, _markup: &str, _width: f32) -> Result<f32> {
            Err(Error::Measurement("no surface".into()))
        }
    }

    #[test]
    fn empty_markup_is_placeholder() {
        let pages = paginate("", 794.0, PageBudget::Finite(100.0), &mut PerBlock);
        assert_eq!(pages.pages, vec![String::new()]);
        assert_eq!(pages.count, 1);
        assert!(paginate("  \n ", 794.0, PageBudget::Unbounded, &mut PerBlock).is_placeholder());
    }

    #[test]
    fn single_paragraph_gets_id() {
        let pages = paginate("<p>Hello</p>", 794.0, PageBudget::Unbounded, &mut PerBlock);
        assert_eq!(pages.pages, vec![r#"<p data-block-id="blk-0">Hello</p>"#]);
    }

    #[test]
    fn list_items_get_ids_not_container() {
        let pages = paginate(
            "<p>a</p><ul><li>x</li><li>y</li></ul>",
            794.0,
            PageBudget::Unbounded,
            &mut PerBlock,
        );
        assert_eq!(block_ids(&pages.pages[0]), vec!["blk-0", "blk-1", "blk-2"]);
        assert!(pages.pages[0].contains("<ul><li"));
    }

    #[test]
    fn splits_when_budget_is_exceeded() {
        let pages = paginate(
            "<p>1</p><p>2</p><p>3</p>",
            794.0,
            PageBudget::Finite(250.0),
            &mut PerBlock,
        );
        assert_eq!(pages.count, 2);
        assert_eq!(block_ids(&pages.pages[0]), vec!["blk-0", "blk-1"]);
        assert_eq!(block_ids(&pages.pages[1]), vec!["blk-2"]);
    }

    #[test]
    fn oversized_block_keeps_its_own_page() {
        let pages = paginate("<p>1</p><p>2</p>", 794.0, PageBudget::Finite(50.0), &mut PerBlock);
        assert_eq!(pages.count, 2);
    }

    #[test]
    fn measurement_failure_degrades_to_one_page() {
        let markup = "<p>1</p><p>2</p><p>3</p>";
        let pages = paginate(markup, 794.0, PageBudget::Finite(50.0), &mut Broken);
        assert_eq!(pages.count, 1);
        assert_eq!(strip_block_ids(&pages.pages[0]), markup);
    }

    #[test]
    fn a4_budget() {
        // 1123px sheet minus 2 × 37.8px margins
        let PageBudget::Finite(px) = PageBudget::a4_content(10.0) else {
            panic!("Expected finite budget");
        };
        assert!((px - 1047.41).abs() < 0.01);
    }

    #[test]
    fn budget_serde_shape() {
        assert_eq!(serde_json::to_string(&PageBudget::Unbounded).unwrap(), r#""unbounded""#);
        let b: PageBudget = serde_json::from_str(r#"{"finite": 900.0}"#).unwrap();
        assert_eq!(b, PageBudget::Finite(900.0));
    }
}
