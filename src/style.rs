//! Style resolver – maps editor markup (tag defaults, Quill classes, the
//! preview's utility classes and inline `style` declarations) to a flat
//! [`ComputedStyle`] consumed by the layout engine and the rasterizer.

use crate::dom::{parse_declarations, DomNode, ElementNode, Tag};
use crate::units::parse_length;

/// Class that switches the preview into export rendering.
pub const EXPORT_MODE_CLASS: &str = "pdf-preview";

/// Class the selection sync puts on the preview block under the caret.
pub const HIGHLIGHT_CLASS: &str = "preview-highlight";

/// Fully resolved style for a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_height: f32,

    // Spacing (px)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,
    /// Vertical gap between element children (`space-y-*`).
    pub gap: f32,

    // Border
    pub border_width: f32,
    pub border_color: Color,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub underline: bool,
    pub strike: bool,
    pub preformatted: bool,

    pub background_color: Color,

    // Multi-column flow
    pub column_count: u32,
    pub column_gap: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_height: 0.0,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            gap: 0.0,
            border_width: 0.0,
            border_color: Color::BLACK,
            font_size: 16.0,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            font_family: "Helvetica".to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.42,
            underline: false,
            strike: false,
            preformatted: false,
            background_color: Color::TRANSPARENT,
            column_count: 1,
            column_gap: 16.0,
        }
    }
}

impl ComputedStyle {
    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }

    /// Copy of the inheritable text properties with the box model reset,
    /// used for text runs and as the starting point for child elements.
    pub fn inherited(&self) -> Self {
        Self {
            font_size: self.font_size,
            font_weight: self.font_weight,
            font_style: self.font_style,
            font_family: self.font_family.clone(),
            color: self.color,
            text_align: self.text_align,
            line_height: self.line_height,
            underline: self.underline,
            strike: self.strike,
            preformatted: self.preformatted,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    ListItem,
    Table,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };
    /// Tailwind gray-200, the preview's `border` colour.
    pub const BORDER_GRAY: Self = Self::rgb(0.898, 0.906, 0.922);
    /// Highlight fill for the block under the editor caret.
    pub const HIGHLIGHT: Self = Self::rgb(0.996, 0.953, 0.780);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// Parse `#hex`, `rgb()`/`rgba()` or a handful of named colours.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_ascii_lowercase();
        if v.starts_with('#') {
            return Self::from_hex(&v);
        }
        if let Some(args) = v
            .strip_prefix("rgba(")
            .or_else(|| v.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<f32> = args
                .split(',')
                .filter_map(|p| p.trim().parse::<f32>().ok())
                .collect();
            return match parts.as_slice() {
                [r, g, b] => Some(Self::rgb(r / 255.0, g / 255.0, b / 255.0)),
                [r, g, b, a] => Some(Self {
                    r: r / 255.0,
                    g: g / 255.0,
                    b: b / 255.0,
                    a: *a,
                }),
                _ => None,
            };
        }
        match v.as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::rgb(1.0, 0.0, 0.0)),
            "green" => Some(Self::rgb(0.0, 0.5, 0.0)),
            "blue" => Some(Self::rgb(0.0, 0.0, 1.0)),
            "gray" | "grey" => Some(Self::rgb(0.5, 0.5, 0.5)),
            "yellow" => Some(Self::rgb(1.0, 1.0, 0.0)),
            "transparent" => Some(Self::TRANSPARENT),
            _ => None,
        }
    }

    /// 8-bit RGBA for the raster canvas.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementNode, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut style = parent.map(ComputedStyle::inherited).unwrap_or_default();
    apply_tag_defaults(&mut style, &element.tag);

    for class in element.classes() {
        apply_class(&mut style, class);
    }

    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }

    style
}

/// User-agent defaults based on tag semantics.
fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    if let Some(level) = tag.heading_level() {
        // 2em, 1.5em, 1.17em, 1em, .83em, .67em of the inherited size.
        let scale = [2.0, 1.5, 1.17, 1.0, 0.83, 0.67][usize::from(level - 1)];
        s.font_size *= scale;
        s.font_weight = FontWeight::Bold;
        return;
    }
    match tag {
        Tag::Ul | Tag::Ol => {
            s.padding_left = 24.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
        }
        Tag::Blockquote => {
            s.padding_left = 16.0;
            s.margin_top = 5.0;
            s.margin_bottom = 5.0;
            s.border_color = Color::rgb(0.8, 0.8, 0.8);
        }
        Tag::Pre => {
            s.preformatted = true;
            s.font_family = "Courier".to_string();
            s.padding_top = 5.0;
            s.padding_right = 10.0;
            s.padding_bottom = 5.0;
            s.padding_left = 10.0;
            s.background_color = Color::rgb(0.94, 0.94, 0.94);
        }
        Tag::Table => {
            s.display = Display::Table;
        }
        Tag::Tr => {
            s.display = Display::TableRow;
        }
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding_top = 2.0;
            s.padding_right = 5.0;
            s.padding_bottom = 2.0;
            s.padding_left = 5.0;
            s.border_width = 1.0;
            s.border_color = Color::rgb(0.0, 0.0, 0.0);
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
            }
        }
        Tag::Strong | Tag::B => {
            s.display = Display::Inline;
            s.font_weight = FontWeight::Bold;
        }
        Tag::Em | Tag::I => {
            s.display = Display::Inline;
            s.font_style = FontStyle::Italic;
        }
        Tag::U => {
            s.display = Display::Inline;
            s.underline = true;
        }
        Tag::S => {
            s.display = Display::Inline;
            s.strike = true;
        }
        Tag::A => {
            s.display = Display::Inline;
            s.underline = true;
            s.color = Color::rgb(0.02, 0.4, 0.8);
        }
        Tag::Code => {
            s.display = Display::Inline;
            s.font_family = "Courier".to_string();
        }
        Tag::Mark => {
            s.display = Display::Inline;
            s.background_color = Color::rgb(1.0, 1.0, 0.0);
        }
        Tag::Span | Tag::Br => {
            s.display = Display::Inline;
        }
        Tag::Img => {
            s.display = Display::Inline;
        }
        Tag::Head => {
            s.display = Display::None;
        }
        Tag::Other(name) if matches!(name.as_str(), "script" | "style" | "title" | "meta") => {
            s.display = Display::None;
        }
        _ => {}
    }
}

/// Apply an editor or utility class.
fn apply_class(s: &mut ComputedStyle, class: &str) {
    match class {
        "ql-align-center" => s.text_align = TextAlign::Center,
        "ql-align-right" => s.text_align = TextAlign::Right,
        "ql-align-justify" => s.text_align = TextAlign::Justify,
        "ql-size-small" => s.font_size = 12.0,
        "ql-size-large" => s.font_size = 24.0,
        "ql-size-huge" => s.font_size = 40.0,
        "ql-font-serif" | "ql-font-georgia" | "ql-font-times" => {
            s.font_family = "Times".to_string()
        }
        "ql-font-monospace" | "ql-font-courier" => s.font_family = "Courier".to_string(),
        "border" => {
            s.border_width = 1.0;
            s.border_color = Color::BORDER_GRAY;
        }
        EXPORT_MODE_CLASS => s.background_color = Color::WHITE,
        HIGHLIGHT_CLASS => s.background_color = Color::HIGHLIGHT,
        "hidden" => s.display = Display::None,
        _ => {
            if let Some(px) = class.strip_prefix("ql-size-").and_then(|v| parse_length(v, 16.0, 0.0)) {
                s.font_size = px;
            } else if let Some(n) = class.strip_prefix("ql-indent-").and_then(|v| v.parse::<f32>().ok()) {
                s.padding_left += 3.0 * s.font_size * n;
            } else if let Some(font) = class.strip_prefix("ql-font-") {
                s.font_family = font.to_string();
            } else {
                try_parse_spacing_class(s, class);
            }
        }
    }
}

/// Tailwind spacing subset: `p-*`, `px-*`, `py-*`, `m-*`, `mb-*`, `mt-*`,
/// `space-y-*` (one unit = 4px).
fn try_parse_spacing_class(s: &mut ComputedStyle, class: &str) {
    let Some((prefix, value)) = class.rsplit_once('-') else {
        return;
    };
    let Ok(units) = value.parse::<f32>() else {
        return;
    };
    let px = units * 4.0;
    match prefix {
        "p" => {
            s.padding_top = px;
            s.padding_right = px;
            s.padding_bottom = px;
            s.padding_left = px;
        }
        "px" => {
            s.padding_left = px;
            s.padding_right = px;
        }
        "py" => {
            s.padding_top = px;
            s.padding_bottom = px;
        }
        "m" => {
            s.margin_top = px;
            s.margin_right = px;
            s.margin_bottom = px;
            s.margin_left = px;
        }
        "mt" => s.margin_top = px,
        "mb" => s.margin_bottom = px,
        "space-y" => s.gap = px,
        _ => {}
    }
}

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for (prop, val) in parse_declarations(style_str) {
        apply_css_property(s, &prop, &val);
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let len = |v: &str| parse_length(v, 16.0, 0.0);
    match prop {
        "display" => {
            s.display = match val {
                "none" => Display::None,
                "inline" | "inline-block" => Display::Inline,
                "block" => Display::Block,
                _ => s.display,
            }
        }
        "font-size" => {
            if let Some(px) = parse_length(val, s.font_size, s.font_size) {
                s.font_size = px;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => {
            if let Some(first) = val.split(',').next() {
                s.font_family = first.trim().trim_matches(|c| c == '\'' || c == '"').to_string();
            }
        }
        "text-decoration" | "text-decoration-line" => {
            s.underline = val.contains("underline");
            s.strike = val.contains("line-through");
        }
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" | "end" => TextAlign::Right,
                "justify" => TextAlign::Justify,
                _ => TextAlign::Left,
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(px) = parse_length(val, s.font_size, s.font_size) {
                s.line_height = px / s.font_size;
            }
        }
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "min-height" => {
            if let Some(px) = len(val) {
                s.min_height = px;
            }
        }
        "margin" => apply_shorthand_spacing(
            val,
            &mut s.margin_top,
            &mut s.margin_right,
            &mut s.margin_bottom,
            &mut s.margin_left,
        ),
        "margin-top" => s.margin_top = len(val).unwrap_or(s.margin_top),
        "margin-right" => s.margin_right = len(val).unwrap_or(s.margin_right),
        "margin-bottom" => s.margin_bottom = len(val).unwrap_or(s.margin_bottom),
        "margin-left" => s.margin_left = len(val).unwrap_or(s.margin_left),
        "padding" => apply_shorthand_spacing(
            val,
            &mut s.padding_top,
            &mut s.padding_right,
            &mut s.padding_bottom,
            &mut s.padding_left,
        ),
        "padding-top" => s.padding_top = len(val).unwrap_or(s.padding_top),
        "padding-right" => s.padding_right = len(val).unwrap_or(s.padding_right),
        "padding-bottom" => s.padding_bottom = len(val).unwrap_or(s.padding_bottom),
        "padding-left" => s.padding_left = len(val).unwrap_or(s.padding_left),
        "border" => {
            if val == "none" || val == "0" {
                s.border_width = 0.0;
            } else {
                for part in val.split_whitespace() {
                    if let Some(px) = len(part) {
                        s.border_width = px;
                    } else if let Some(c) = Color::parse(part) {
                        s.border_color = c;
                    }
                }
            }
        }
        "border-width" => s.border_width = len(val).unwrap_or(s.border_width),
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                s.border_color = c;
            }
        }
        "column-count" | "columns" => {
            s.column_count = val
                .split_whitespace()
                .find_map(|p| p.parse::<u32>().ok())
                .unwrap_or(1)
                .max(1);
        }
        "column-gap" => s.column_gap = len(val).unwrap_or(s.column_gap),
        "white-space" => s.preformatted = val.starts_with("pre"),
        _ => {}
    }
}

fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(p) = s.strip_suffix('%') {
        p.parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(s, 16.0, 0.0)
            .map(Dimension::Px)
            .unwrap_or(Dimension::Auto)
    }
}

fn apply_shorthand_spacing(
    val: &str,
    top: &mut f32,
    right: &mut f32,
    bottom: &mut f32,
    left: &mut f32,
) {
    let parts: Vec<f32> = val
        .split_whitespace()
        .filter_map(|p| parse_length(p, 16.0, 0.0))
        .collect();
    match parts.as_slice() {
        [all] => {
            *top = *all;
            *right = *all;
            *bottom = *all;
            *left = *all;
        }
        [v, h] => {
            *top = *v;
            *bottom = *v;
            *right = *h;
            *left = *h;
        }
        [t, h, b] => {
            *top = *t;
            *right = *h;
            *bottom = *b;
            *left = *h;
        }
        [t, r, b, l] => {
            *top = *t;
            *right = *r;
            *bottom = *b;
            *left = *l;
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Image source for `<img>`, the only attribute layout needs.
        src: Option<String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

impl StyledNode {
    pub fn is_inline(&self) -> bool {
        match self {
            StyledNode::Text { .. } => true,
            StyledNode::Element { style, tag, .. } => {
                style.display == Display::Inline && *tag != Tag::Img
            }
        }
    }
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
/// `display: none` subtrees are dropped.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style);
                if style.display == Display::None {
                    continue;
                }
                let children = build_styled_tree(&e.children, Some(&style));
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    src: e.src().map(str::to_string),
                });
            }
            DomNode::Text(text) => {
                if !text.is_empty() {
                    let style = parent_style
                        .map(ComputedStyle::inherited)
                        .unwrap_or_default();
                    result.push(StyledNode::Text {
                        text: text.clone(),
                        style,
                    });
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn style_of(html: &str) -> ComputedStyle {
        let nodes = parse_html(html);
        resolve_style(nodes[0].as_element().unwrap(), None)
    }

    #[test]
    fn tailwind_padding() {
        let mut s = ComputedStyle::default();
        apply_class(&mut s, "p-8");
        assert_eq!(s.padding_top, 32.0);
        assert_eq!(s.padding_left, 32.0);
    }

    #[test]
    fn quill_classes() {
        let s = style_of(r#"<p class="ql-align-center ql-size-24px ql-indent-1">x</p>"#);
        assert_eq!(s.text_align, TextAlign::Center);
        assert_eq!(s.font_size, 24.0);
        assert_eq!(s.padding_left, 72.0);
    }

    #[test]
    fn heading_scales_inherited_size() {
        let s = style_of("<h1>x</h1>");
        assert_eq!(s.font_size, 32.0);
        assert!(s.is_bold());
    }

    #[test]
    fn inline_style_font_size_and_color() {
        let mut s = ComputedStyle::default();
        apply_inline_style(&mut s, "font-size: 24px; color: rgb(255, 0, 0)");
        assert_eq!(s.font_size, 24.0);
        assert!((s.color.r - 1.0).abs() < 0.01);
    }

    #[test]
    fn column_properties() {
        let s = style_of(r#"<div style="column-count: 2; column-gap: 24px">x</div>"#);
        assert_eq!(s.column_count, 2);
        assert_eq!(s.column_gap, 24.0);
    }

    #[test]
    fn markers_set_backgrounds() {
        assert_eq!(style_of(r#"<div class="pdf-preview">x</div>"#).background_color, Color::WHITE);
        assert_eq!(
            style_of(r#"<p class="preview-highlight">x</p>"#).background_color,
            Color::HIGHLIGHT
        );
    }

    #[test]
    fn color_from_hex() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
    }

    #[test]
    fn text_does_not_inherit_box_model() {
        let nodes = parse_html(r#"<p style="padding: 10px; background: #000">x</p>"#);
        let styled = build_styled_tree(&nodes, None);
        let StyledNode::Element { children, .. } = &styled[0] else {
            panic!("Expected element");
        };
        let StyledNode::Text { style, .. } = &children[0] else {
            panic!("Expected text");
        };
        assert_eq!(style.padding_left, 0.0);
        assert!(style.background_color.is_transparent());
    }
}
