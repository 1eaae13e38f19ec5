//! Layout engine – uses Taffy to compute block flow (flex columns, table
//! rows) from a styled DOM tree, then converts the result into a tree of
//! positioned boxes. Inline content is wrapped into lines up front so text
//! leaves enter Taffy with fixed sizes.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use taffy::prelude::*;

use crate::dom::Tag;
use crate::error::{Error, Result};
use crate::fonts::{is_wide, FontManager};
use crate::style::{self as css, Color, ComputedStyle, StyledNode, TextAlign};

// ---------------------------------------------------------------------------
// Layout tree
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (CSS px, origin at the top-left
/// of the laid-out content).
#[derive(Debug, Clone)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    /// Wrapped inline content.
    Text { lines: Vec<TextLine> },
    Image { src: String },
    /// List item marker drawn in the left gutter.
    ListItem { marker: String },
}

/// One wrapped line; offsets are relative to the owning box.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub top: f32,
    pub height: f32,
    pub baseline: f32,
    pub fragments: Vec<TextFragment>,
}

/// A run of text sharing one style on a single line.
#[derive(Debug, Clone)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub width: f32,
    pub style: ComputedStyle,
}

/// Result of a layout pass.
#[derive(Debug, Clone)]
pub struct LayoutTree {
    pub boxes: Vec<LayoutBox>,
    pub width: f32,
    /// Total content height in CSS px.
    pub height: f32,
}

impl LayoutBox {
    /// Visit this box and all descendants depth-first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a LayoutBox)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

fn layout_err<E: std::fmt::Debug>(e: E) -> Error {
    Error::Layout(format!("{e:?}"))
}

// ---------------------------------------------------------------------------
// Inline formatting
// ---------------------------------------------------------------------------

enum InlineItem {
    Text { text: String, style: ComputedStyle },
    Break,
}

enum Token {
    Word {
        text: String,
        run: usize,
        space_before: bool,
    },
    Break,
}

/// Flatten inline children (spans, marks, text, `<br>`) into styled runs.
fn collect_inline(node: &StyledNode, background: Option<Color>, out: &mut Vec<InlineItem>) {
    match node {
        StyledNode::Text { text, style } => {
            let mut style = style.clone();
            if let Some(bg) = background {
                style.background_color = bg;
            }
            out.push(InlineItem::Text {
                text: text.clone(),
                style,
            });
        }
        StyledNode::Element { tag: Tag::Br, .. } => out.push(InlineItem::Break),
        StyledNode::Element { style, children, .. } => {
            let bg = if style.background_color.is_transparent() {
                background
            } else {
                Some(style.background_color)
            };
            for child in children {
                collect_inline(child, bg, out);
            }
        }
    }
}

/// Split runs into breakable words. Whitespace collapses into a single
/// `space_before` flag; wide (CJK) characters may break anywhere.
fn tokenize(items: &[InlineItem]) -> (Vec<Token>, Vec<ComputedStyle>) {
    let mut tokens = Vec::new();
    let mut styles = Vec::new();
    let mut pending_space = false;

    for item in items {
        let (text, style) = match item {
            InlineItem::Break => {
                tokens.push(Token::Break);
                pending_space = false;
                continue;
            }
            InlineItem::Text { text, style } => (text, style),
        };
        let run = styles.len();
        styles.push(style.clone());

        if style.preformatted {
            for (i, segment) in text.split('\n').enumerate() {
                if i > 0 {
                    tokens.push(Token::Break);
                }
                if !segment.is_empty() {
                    tokens.push(Token::Word {
                        text: segment.to_string(),
                        run,
                        space_before: false,
                    });
                }
            }
            continue;
        }

        let mut word = String::new();
        let mut word_space = false;
        for ch in text.chars() {
            if ch.is_whitespace() && ch != '\u{a0}' {
                if !word.is_empty() {
                    tokens.push(Token::Word {
                        text: std::mem::take(&mut word),
                        run,
                        space_before: word_space,
                    });
                }
                pending_space = true;
            } else if is_wide(ch) {
                if !word.is_empty() {
                    tokens.push(Token::Word {
                        text: std::mem::take(&mut word),
                        run,
                        space_before: word_space,
                    });
                    pending_space = false;
                }
                tokens.push(Token::Word {
                    text: ch.to_string(),
                    run,
                    space_before: pending_space,
                });
                pending_space = false;
            } else {
                if word.is_empty() {
                    word_space = pending_space;
                    pending_space = false;
                }
                word.push(ch);
            }
        }
        if !word.is_empty() {
            tokens.push(Token::Word {
                text: word,
                run,
                space_before: word_space,
            });
        }
    }
    (tokens, styles)
}

struct PendingFragment {
    text: String,
    x: f32,
    width: f32,
    run: usize,
}

/// Greedy line breaking. A trailing `<br>` does not open an extra line,
/// but a group holding only breaks still yields one empty line each.
fn break_lines(tokens: &[Token], styles: &[ComputedStyle], max_w: f32, fonts: &FontManager) -> Vec<(Vec<PendingFragment>, f32)> {
    let measure = |text: &str, run: usize| {
        let s = &styles[run];
        fonts.measure_text_width(text, s.font_size, s.is_bold(), s.is_italic(), &s.font_family)
    };

    let mut lines = Vec::new();
    let mut current: Vec<PendingFragment> = Vec::new();
    let mut cur_w = 0.0f32;

    for token in tokens {
        match token {
            Token::Break => {
                lines.push((std::mem::take(&mut current), cur_w));
                cur_w = 0.0;
            }
            Token::Word {
                text,
                run,
                space_before,
            } => {
                let w = measure(text, *run);
                let mut sp = if *space_before && !current.is_empty() {
                    measure(" ", *run)
                } else {
                    0.0
                };
                if !current.is_empty() && cur_w + sp + w > max_w {
                    lines.push((std::mem::take(&mut current), cur_w));
                    cur_w = 0.0;
                    sp = 0.0;
                }
                match current.last_mut() {
                    Some(last) if last.run == *run => {
                        if sp > 0.0 {
                            last.text.push(' ');
                        }
                        last.text.push_str(text);
                        last.width += sp + w;
                    }
                    _ => current.push(PendingFragment {
                        text: text.clone(),
                        x: cur_w + sp,
                        width: w,
                        run: *run,
                    }),
                }
                cur_w += sp + w;
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push((current, cur_w));
    }
    lines
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    /// Build children of a block container, grouping consecutive inline
    /// nodes into anonymous text leaves.
    fn build_children(&mut self, children: &[StyledNode], parent: &ComputedStyle, parent_tag: Option<&Tag>, width: f32) -> Result<Vec<NodeId>> {
        let mut ids = Vec::new();
        let mut inline_group: Vec<&StyledNode> = Vec::new();
        let mut list_counter = 0u32;

        for child in children {
            if child.is_inline() {
                inline_group.push(child);
                continue;
            }
            if let Some(id) = self.build_inline_group(&inline_group, parent, width)? {
                ids.push(id);
            }
            inline_group.clear();

            let id = self.build_node(child, width)?;
            if let StyledNode::Element { tag: Tag::Li, .. } = child {
                list_counter += 1;
                let marker = if parent_tag == Some(&Tag::Ol) {
                    format!("{list_counter}.")
                } else {
                    "\u{2022}".to_string()
                };
                self.node_content.insert(id, BoxContent::ListItem { marker });
            }
            ids.push(id);
        }
        if let Some(id) = self.build_inline_group(&inline_group, parent, width)? {
            ids.push(id);
        }
        Ok(ids)
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> Result<NodeId> {
        match styled {
            StyledNode::Text { style, .. } => {
                let parent = style.clone();
                let id = self.build_inline_group(&[styled], &parent, parent_width)?;
                match id {
                    Some(id) => Ok(id),
                    None => self.taffy.new_leaf(Style::default()).map_err(layout_err),
                }
            }
            StyledNode::Element {
                tag: Tag::Img,
                style,
                src,
                ..
            } => self.build_image(style, src.as_deref().unwrap_or(""), parent_width),
            StyledNode::Element {
                tag,
                style,
                children,
                ..
            } => self.build_element(tag, style, children, parent_width),
        }
    }

    /// Wrap an inline group into a fixed-size text leaf. Returns `None` for
    /// groups that hold only collapsible whitespace.
    fn build_inline_group(&mut self, group: &[&StyledNode], block: &ComputedStyle, max_w: f32) -> Result<Option<NodeId>> {
        if group.is_empty() {
            return Ok(None);
        }
        let mut items = Vec::new();
        for node in group {
            collect_inline(node, None, &mut items);
        }
        let (tokens, styles) = tokenize(&items);
        if tokens.is_empty() {
            return Ok(None);
        }

        let raw_lines = break_lines(&tokens, &styles, max_w, self.fonts);
        let mut lines = Vec::with_capacity(raw_lines.len());
        let mut top = 0.0f32;
        for (fragments, line_w) in raw_lines {
            // The tallest run on the line sets its height and baseline.
            let lead = fragments
                .iter()
                .map(|f| &styles[f.run])
                .max_by(|a, b| a.font_size.total_cmp(&b.font_size))
                .unwrap_or(block);
            let height = self.fonts.line_height_px(lead.font_size, lead.line_height);
            let ascent = self
                .fonts
                .ascender_px(lead.font_size, lead.is_bold(), lead.is_italic(), &lead.font_family);
            let baseline = top + (height - lead.font_size) / 2.0 + ascent;

            let shift = match block.text_align {
                TextAlign::Center => ((max_w - line_w) / 2.0).max(0.0),
                TextAlign::Right => (max_w - line_w).max(0.0),
                TextAlign::Left | TextAlign::Justify => 0.0,
            };
            lines.push(TextLine {
                top,
                height,
                baseline,
                fragments: fragments
                    .into_iter()
                    .map(|f| TextFragment {
                        text: f.text,
                        x: f.x + shift,
                        width: f.width,
                        style: styles[f.run].clone(),
                    })
                    .collect(),
            });
            top += height;
        }

        let node = self
            .taffy
            .new_leaf(Style {
                size: Size {
                    width: Dimension::Length(max_w.max(0.0)),
                    height: Dimension::Length(top),
                },
                flex_shrink: 0.0,
                ..Default::default()
            })
            .map_err(layout_err)?;
        self.node_styles.insert(node, block.inherited());
        self.node_content.insert(node, BoxContent::Text { lines });
        Ok(Some(node))
    }

    fn build_image(&mut self, style: &ComputedStyle, src: &str, parent_width: f32) -> Result<NodeId> {
        let mut style = resolve_img_auto_dimensions(src, style, parent_width).unwrap_or_else(|| style.clone());

        // Editor images never overflow their column.
        if let css::Dimension::Px(w) = style.width {
            if w > parent_width && parent_width > 0.0 {
                if let css::Dimension::Px(h) = style.height {
                    style.height = css::Dimension::Px(h * parent_width / w);
                }
                style.width = css::Dimension::Px(parent_width);
            }
        }

        let mut ts = self.computed_to_taffy(&style, &Tag::Img);
        ts.flex_shrink = 0.0;
        ts.align_self = Some(taffy::AlignSelf::Start);
        if matches!(style.width, css::Dimension::Auto) {
            ts.size.width = Dimension::Length(0.0);
        }
        if matches!(style.height, css::Dimension::Auto) {
            ts.size.height = Dimension::Length(0.0);
        }
        let node = self.taffy.new_leaf(ts).map_err(layout_err)?;
        self.node_styles.insert(node, style);
        self.node_content.insert(node, BoxContent::Image { src: src.to_string() });
        Ok(node)
    }

    fn build_element(&mut self, tag: &Tag, style: &ComputedStyle, children: &[StyledNode], parent_width: f32) -> Result<NodeId> {
        let my_width = match style.width {
            css::Dimension::Px(w) => w,
            css::Dimension::Percent(p) => parent_width * p / 100.0,
            css::Dimension::Auto => parent_width - style.margin_left - style.margin_right,
        };
        let inner_width = (my_width
            - style.padding_left
            - style.padding_right
            - 2.0 * style.border_width)
            .max(0.0);

        // Table rows share their width evenly; multi-column containers
        // flow their content at the width of a single column.
        let child_build_width = if *tag == Tag::Tr {
            let cells = children
                .iter()
                .filter(|c| matches!(c, StyledNode::Element { .. }))
                .count()
                .max(1);
            inner_width / cells as f32
        } else if style.column_count > 1 {
            let n = style.column_count as f32;
            ((inner_width - style.column_gap * (n - 1.0)) / n).max(1.0)
        } else {
            inner_width
        };

        let child_nodes = self.build_children(children, style, Some(tag), child_build_width)?;
        let taffy_style = self.computed_to_taffy(style, tag);
        let node = self
            .taffy
            .new_with_children(taffy_style, &child_nodes)
            .map_err(layout_err)?;
        self.node_styles.insert(node, style.clone());
        Ok(node)
    }

    fn computed_to_taffy(&self, s: &ComputedStyle, tag: &Tag) -> Style {
        let mut ts = Style {
            display: taffy::Display::Flex,
            flex_direction: taffy::FlexDirection::Column,
            flex_shrink: 0.0,
            ..Default::default()
        };

        match tag {
            Tag::Tr => {
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.align_items = Some(taffy::AlignItems::Stretch);
                ts.size.width = Dimension::Percent(1.0);
                ts.min_size.width = Dimension::Length(0.0);
            }
            Tag::Td | Tag::Th => {
                ts.flex_grow = 1.0;
                ts.flex_shrink = 1.0;
                ts.flex_basis = Dimension::Length(0.0); // equal columns
                ts.min_size.width = Dimension::Length(0.0);
            }
            _ => {
                ts.size = Size {
                    width: dim_to_taffy(s.width),
                    height: dim_to_taffy(s.height),
                };
            }
        }
        ts.min_size.height = Dimension::Length(s.min_height);

        ts.margin = Rect {
            top: LengthPercentageAuto::Length(s.margin_top),
            right: LengthPercentageAuto::Length(s.margin_right),
            bottom: LengthPercentageAuto::Length(s.margin_bottom),
            left: LengthPercentageAuto::Length(s.margin_left),
        };
        ts.padding = Rect {
            top: LengthPercentage::Length(s.padding_top),
            right: LengthPercentage::Length(s.padding_right),
            bottom: LengthPercentage::Length(s.padding_bottom),
            left: LengthPercentage::Length(s.padding_left),
        };
        ts.border = Rect {
            top: LengthPercentage::Length(s.border_width),
            right: LengthPercentage::Length(s.border_width),
            bottom: LengthPercentage::Length(s.border_width),
            left: LengthPercentage::Length(s.border_width),
        };
        ts.gap = Size {
            width: LengthPercentage::Length(0.0),
            height: LengthPercentage::Length(s.gap),
        };
        ts
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<LayoutBox> {
        let layout = self.taffy.layout(node).map_err(layout_err)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)
            .map_err(layout_err)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>>>()?;

        Ok(LayoutBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            style,
            content,
            children,
        })
    }
}

fn dim_to_taffy(d: css::Dimension) -> Dimension {
    match d {
        css::Dimension::Auto => Dimension::Auto,
        css::Dimension::Px(v) => Dimension::Length(v),
        css::Dimension::Percent(v) => Dimension::Percent(v / 100.0),
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
pub fn parse_data_uri(src: &str) -> std::result::Result<Vec<u8>, String> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URI".to_string())?;
    let comma_pos = rest
        .find(',')
        .ok_or_else(|| "invalid data URI: missing `,` separator".to_string())?;
    if !rest[..comma_pos].contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(rest[comma_pos + 1..].trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

/// Return a copy of `style` with `Auto` width/height replaced by values
/// derived from the image's intrinsic size. `None` when the source cannot be
/// decoded or both dimensions are already known.
fn resolve_img_auto_dimensions(src: &str, style: &ComputedStyle, parent_width: f32) -> Option<ComputedStyle> {
    let known_w = match style.width {
        css::Dimension::Px(v) => Some(v),
        css::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        css::Dimension::Auto => None,
    };
    let known_h = match style.height {
        css::Dimension::Px(v) => Some(v),
        _ => None,
    };
    if known_w.is_some() && known_h.is_some() {
        return None;
    }

    let bytes = parse_data_uri(src).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => {
            s.width = css::Dimension::Px(w);
            s.height = css::Dimension::Px((w / aspect).max(1.0));
        }
        (None, Some(h)) => s.width = css::Dimension::Px((h * aspect).max(1.0)),
        _ => {
            s.width = css::Dimension::Px(px_w);
            s.height = css::Dimension::Px(px_h);
        }
    }
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out a styled tree at `content_width` with unbounded height.
pub fn compute_layout(styled_nodes: &[StyledNode], content_width: f32, fonts: &FontManager) -> Result<LayoutTree> {
    let mut builder = LayoutBuilder::new(fonts);
    let root_style = ComputedStyle::default();
    let child_ids = builder.build_children(styled_nodes, &root_style, None, content_width)?;

    let root = builder
        .taffy
        .new_with_children(
            Style {
                display: taffy::Display::Flex,
                flex_direction: taffy::FlexDirection::Column,
                size: Size {
                    width: Dimension::Length(content_width),
                    height: Dimension::Auto,
                },
                ..Default::default()
            },
            &child_ids,
        )
        .map_err(layout_err)?;

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(layout_err)?;

    let root_box = builder.extract(root, 0.0, 0.0)?;
    log::trace!(
        "Laid out {} top-level boxes, height {:.1}px",
        root_box.children.len(),
        root_box.height
    );
    Ok(LayoutTree {
        width: content_width,
        height: root_box.height,
        boxes: root_box.children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::style::build_styled_tree;

    fn layout(html: &str, width: f32) -> LayoutTree {
        let dom = parse_html(html);
        let styled = build_styled_tree(&dom, None);
        compute_layout(&styled, width, &FontManager::default()).unwrap()
    }

    fn text_lines(b: &LayoutBox) -> usize {
        let mut n = 0;
        b.walk(&mut |b| {
            if let BoxContent::Text { lines } = &b.content {
                n += lines.len();
            }
        });
        n
    }

    #[test]
    fn single_paragraph_is_one_line() {
        let tree = layout("<p>Hello world</p>", 400.0);
        assert_eq!(tree.boxes.len(), 1);
        // 16px × 1.42
        assert!((tree.height - 22.72).abs() < 0.01);
        assert_eq!(text_lines(&tree.boxes[0]), 1);
    }

    #[test]
    fn long_text_wraps() {
        // "word" is 32px plus an 8px space at 16px
        let text = "word ".repeat(20);
        let tree = layout(&format!("<p>{text}</p>"), 100.0);
        assert!(text_lines(&tree.boxes[0]) > 5);
    }

    #[test]
    fn empty_line_paragraph_has_height() {
        let tree = layout("<p><br></p>", 400.0);
        assert!((tree.height - 22.72).abs() < 0.01);
    }

    #[test]
    fn trailing_break_adds_no_line() {
        let tree = layout("<p>a<br></p>", 400.0);
        assert_eq!(text_lines(&tree.boxes[0]), 1);
        let tree = layout("<p>a<br>b</p>", 400.0);
        assert_eq!(text_lines(&tree.boxes[0]), 2);
    }

    #[test]
    fn styled_runs_share_a_line() {
        let tree = layout("<p>Hello <strong>bold</strong> world</p>", 400.0);
        let BoxContent::Text { lines } = &tree.boxes[0].children[0].content else {
            panic!("Expected text leaf");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].fragments.len(), 3);
        assert!(lines[0].fragments[1].style.is_bold());
        assert!(lines[0].fragments[1].x > lines[0].fragments[0].x);
    }

    #[test]
    fn centered_text_is_shifted() {
        let tree = layout(r#"<p class="ql-align-center">ab</p>"#, 200.0);
        let BoxContent::Text { lines } = &tree.boxes[0].children[0].content else {
            panic!("Expected text leaf");
        };
        // "ab" = 16px wide
        assert!((lines[0].fragments[0].x - 92.0).abs() < 0.01);
    }

    #[test]
    fn blocks_stack_vertically() {
        let tree = layout("<p>One</p><p>Two</p>", 400.0);
        assert_eq!(tree.boxes.len(), 2);
        assert!(tree.boxes[1].y >= tree.boxes[0].y + tree.boxes[0].height - 0.01);
    }

    #[test]
    fn padding_adds_to_height() {
        let tree = layout(r#"<div class="p-8"><p>x</p></div>"#, 400.0);
        assert!((tree.height - (22.72 + 64.0)).abs() < 0.01);
    }

    #[test]
    fn list_items_get_markers() {
        let tree = layout("<ol><li>a</li><li>b</li></ol>", 400.0);
        let markers: Vec<String> = tree.boxes[0]
            .children
            .iter()
            .filter_map(|c| match &c.content {
                BoxContent::ListItem { marker } => Some(marker.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec!["1.", "2."]);
    }

    #[test]
    fn columns_narrow_the_flow() {
        let text = "word ".repeat(30);
        let single = layout(&format!("<div><p>{text}</p></div>"), 400.0);
        let double = layout(
            &format!(r#"<div style="column-count: 2; column-gap: 20px"><p>{text}</p></div>"#),
            400.0,
        );
        assert!(double.height > single.height);
    }

    #[test]
    fn table_cells_share_row() {
        let tree = layout("<table><tr><td>A</td><td>B</td></tr></table>", 400.0);
        let row = &tree.boxes[0].children[0];
        assert_eq!(row.children.len(), 2);
        assert!((row.children[0].y - row.children[1].y).abs() < 0.01);
        assert!(row.children[1].x > row.children[0].x);
    }

    #[test]
    fn data_uri_parsing() {
        assert_eq!(parse_data_uri("data:text/plain;base64,aGk=").unwrap(), b"hi");
        assert!(parse_data_uri("https://example.com/a.png").is_err());
        assert!(parse_data_uri("data:text/plain,hi").is_err());
    }

    #[test]
    fn image_without_source_collapses() {
        let tree = layout(r#"<p><img src="https://example.com/a.png"></p>"#, 400.0);
        assert_eq!(tree.height, 0.0);
    }
}
