//! Rasterizer – paints a preview tree into an RGBA bitmap.
//!
//! [`BoxRasterizer`] lays the tree out with the layout engine and paints
//! boxes back to front: background, border, then content. Text is drawn with
//! `rusttype` glyph coverage when a real font is loaded, otherwise as one
//! solid block per glyph, which keeps output byte-identical across runs and
//! machines.

use ::image::{imageops, Pixel, Rgba, RgbaImage};
use rusttype::point;

use crate::dom::{DomNode, ElementNode};
use crate::error::{Error, Result};
use crate::fonts::{heuristic_advance, FontManager};
use crate::layout::{compute_layout, parse_data_uri, BoxContent, LayoutBox, TextFragment, TextLine};
use crate::style::{build_styled_tree, Color};

/// Largest canvas edge accepted, in device pixels. Tile exports rasterize
/// sheet by sheet, so there the limit applies to one sheet.
pub const MAX_CANVAS_EDGE: u32 = 32_767;

/// Turns a rendered preview into a bitmap.
pub trait Rasterizer {
    /// Rasterize `root` at `scale` device pixels per CSS px.
    fn rasterize(&mut self, root: &ElementNode, scale: f32) -> Result<RgbaImage>;
}

/// Built-in [`Rasterizer`] on top of the layout engine.
pub struct BoxRasterizer {
    fonts: FontManager,
    /// Width the preview is laid out at, in CSS px.
    width: f32,
}

impl BoxRasterizer {
    pub fn new(width: f32) -> Self {
        Self::with_fonts(FontManager::default(), width)
    }

    pub fn with_fonts(fonts: FontManager, width: f32) -> Self {
        Self { fonts, width }
    }
}

impl Rasterizer for BoxRasterizer {
    fn rasterize(&mut self, root: &ElementNode, scale: f32) -> Result<RgbaImage> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::Rasterization(format!("invalid scale {scale}")));
        }
        let dom = vec![DomNode::Element(root.clone())];
        let styled = build_styled_tree(&dom, None);
        let tree = compute_layout(&styled, self.width, &self.fonts)
            .map_err(|e| Error::Rasterization(e.to_string()))?;

        let w = (self.width * scale).ceil().max(1.0) as u32;
        let h = (tree.height * scale).ceil().max(1.0) as u32;
        if w > MAX_CANVAS_EDGE || h > MAX_CANVAS_EDGE {
            return Err(Error::Rasterization(format!(
                "canvas {w}x{h} exceeds {MAX_CANVAS_EDGE}px"
            )));
        }

        let mut painter = Painter {
            img: RgbaImage::new(w, h),
            scale,
            fonts: &self.fonts,
        };
        for b in &tree.boxes {
            painter.paint_box(b);
        }
        log::debug!("Rasterized preview to {w}x{h}px at {scale}x");
        Ok(painter.img)
    }
}

struct Painter<'a> {
    img: RgbaImage,
    scale: f32,
    fonts: &'a FontManager,
}

impl Painter<'_> {
    fn paint_box(&mut self, b: &LayoutBox) {
        let s = &b.style;
        if !s.background_color.is_transparent() {
            self.fill_rect(b.x, b.y, b.width, b.height, s.background_color);
        }
        if s.border_width > 0.0 {
            let bw = s.border_width;
            self.fill_rect(b.x, b.y, b.width, bw, s.border_color);
            self.fill_rect(b.x, b.y + b.height - bw, b.width, bw, s.border_color);
            self.fill_rect(b.x, b.y, bw, b.height, s.border_color);
            self.fill_rect(b.x + b.width - bw, b.y, bw, b.height, s.border_color);
        }

        match &b.content {
            BoxContent::Text { lines } => {
                for line in lines {
                    self.paint_line(b, line);
                }
            }
            BoxContent::Image { src } => self.paint_image(b, src),
            BoxContent::ListItem { marker } => self.paint_marker(b, marker),
            BoxContent::None => {}
        }

        for child in &b.children {
            self.paint_box(child);
        }
    }

    fn paint_line(&mut self, b: &LayoutBox, line: &TextLine) {
        for frag in &line.fragments {
            let fs = &frag.style;
            if !fs.background_color.is_transparent() {
                self.fill_rect(b.x + frag.x, b.y + line.top, frag.width, line.height, fs.background_color);
            }
            self.paint_text(frag, b.x + frag.x, b.y + line.baseline);

            let thickness = (fs.font_size / 16.0).max(1.0);
            if fs.underline {
                self.fill_rect(b.x + frag.x, b.y + line.baseline + thickness, frag.width, thickness, fs.color);
            }
            if fs.strike {
                let y = b.y + line.baseline - fs.font_size * 0.3;
                self.fill_rect(b.x + frag.x, y, frag.width, thickness, fs.color);
            }
        }
    }

    fn paint_text(&mut self, frag: &TextFragment, x: f32, baseline: f32) {
        let s = &frag.style;
        let fonts = self.fonts;
        match fonts.glyph_font(s.is_bold(), s.is_italic(), &s.font_family) {
            Some(face) => {
                let color = s.color.to_rgba8();
                let origin = point(x * self.scale, baseline * self.scale);
                for glyph in face.font.layout(&frag.text, face.scale(s.font_size * self.scale), origin) {
                    let Some(bb) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    glyph.draw(|gx, gy, coverage| {
                        self.blend_at(bb.min.x + gx as i32, bb.min.y + gy as i32, color, coverage);
                    });
                }
            }
            None => {
                // Greeked glyphs: an x-height block per visible character.
                let mut pen = x;
                for ch in frag.text.chars() {
                    let advance = heuristic_advance(ch, s.font_size, s.is_bold(), &s.font_family);
                    if !ch.is_whitespace() {
                        let h = s.font_size * 0.5;
                        self.fill_rect(pen + advance * 0.1, baseline - h, advance * 0.8, h, s.color);
                    }
                    pen += advance;
                }
            }
        }
    }

    fn paint_marker(&mut self, b: &LayoutBox, marker: &str) {
        let s = &b.style;
        let width = self
            .fonts
            .measure_text_width(marker, s.font_size, s.is_bold(), s.is_italic(), &s.font_family);
        let baseline = first_baseline(b).unwrap_or(b.y + s.font_size);
        let frag = TextFragment {
            text: marker.to_string(),
            x: 0.0,
            width,
            style: s.clone(),
        };
        self.paint_text(&frag, b.x - width - 6.0, baseline);
    }

    fn paint_image(&mut self, b: &LayoutBox, src: &str) {
        let w = (b.width * self.scale).round() as u32;
        let h = (b.height * self.scale).round() as u32;
        if w == 0 || h == 0 {
            return;
        }
        let bytes = match parse_data_uri(src) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                return;
            }
        };
        let decoded = match ::image::load_from_memory(&bytes) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                log::warn!("Skipping image, decode error: {e}");
                return;
            }
        };
        let resized = imageops::resize(&decoded, w, h, imageops::FilterType::Triangle);
        imageops::overlay(
            &mut self.img,
            &resized,
            (b.x * self.scale).round() as i64,
            (b.y * self.scale).round() as i64,
        );
    }

    /// Fill a CSS-px rectangle, snapping edges to device pixels.
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let (cw, ch) = self.img.dimensions();
        let x0 = ((x * self.scale).round().max(0.0) as u32).min(cw);
        let y0 = ((y * self.scale).round().max(0.0) as u32).min(ch);
        let x1 = (((x + w) * self.scale).round().max(0.0) as u32).min(cw);
        let y1 = (((y + h) * self.scale).round().max(0.0) as u32).min(ch);
        let rgba = color.to_rgba8();
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_at(px as i32, py as i32, rgba, 1.0);
            }
        }
    }

    /// Composite `rgba` over one device pixel, its alpha scaled by
    /// `coverage`. Pixels off the canvas are ignored.
    fn blend_at(&mut self, x: i32, y: i32, rgba: [u8; 4], coverage: f32) {
        let (cw, ch) = self.img.dimensions();
        if x < 0 || y < 0 || x as u32 >= cw || y as u32 >= ch {
            return;
        }
        let alpha = (rgba[3] as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
        if alpha == 0 {
            return;
        }
        let src = Rgba([rgba[0], rgba[1], rgba[2], alpha]);
        self.img.get_pixel_mut(x as u32, y as u32).blend(&src);
    }
}

/// Baseline of the first text line inside `b`, in document coordinates.
fn first_baseline(b: &LayoutBox) -> Option<f32> {
    if let BoxContent::Text { lines } = &b.content {
        if let Some(line) = lines.first() {
            return Some(b.y + line.baseline);
        }
    }
    b.children.iter().find_map(first_baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, Tag};

    fn root(html: &str) -> ElementNode {
        let mut root = ElementNode::new(Tag::Div);
        root.children = parse_html(html);
        root
    }

    #[test]
    fn canvas_size_follows_scale() {
        let img = BoxRasterizer::new(100.0)
            .rasterize(&root(r#"<div style="height: 50px"></div>"#), 2.0)
            .unwrap();
        assert_eq!(img.dimensions(), (200, 100));
    }

    #[test]
    fn export_class_paints_white_background() {
        let mut r = root(r#"<div style="height: 10px"></div>"#);
        r.add_class("pdf-preview");
        let img = BoxRasterizer::new(20.0).rasterize(&r, 1.0).unwrap();
        assert_eq!(img.get_pixel(5, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn unstyled_canvas_is_transparent() {
        let img = BoxRasterizer::new(20.0)
            .rasterize(&root(r#"<div style="height: 10px"></div>"#), 1.0)
            .unwrap();
        assert_eq!(img.get_pixel(5, 5).0[3], 0);
    }

    #[test]
    fn text_leaves_ink() {
        let img = BoxRasterizer::new(200.0)
            .rasterize(&root("<p>Hello</p>"), 1.0)
            .unwrap();
        let inked = img.pixels().filter(|p| p.0[3] > 0).count();
        assert!(inked > 0);
    }

    #[test]
    fn invalid_scale_is_rejected() {
        let err = BoxRasterizer::new(100.0).rasterize(&root("<p>x</p>"), 0.0);
        assert!(matches!(err, Err(Error::Rasterization(_))));
    }

    #[test]
    fn partial_coverage_blends_over_white() {
        let mut painter = Painter {
            img: RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])),
            scale: 1.0,
            fonts: &FontManager::default(),
        };
        painter.blend_at(1, 1, Color::BLACK.to_rgba8(), 0.5);
        painter.blend_at(2, 2, Color::BLACK.to_rgba8(), 1.0);
        painter.blend_at(-1, 9, Color::BLACK.to_rgba8(), 1.0);
        let half = painter.img.get_pixel(1, 1).0;
        assert!(half[0] > 100 && half[0] < 150, "{half:?}");
        assert_eq!(half[3], 255);
        assert_eq!(painter.img.get_pixel(2, 2).0, [0, 0, 0, 255]);
        assert_eq!(painter.img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn full_coverage_replaces_transparent_pixel() {
        let mut painter = Painter {
            img: RgbaImage::new(2, 2),
            scale: 1.0,
            fonts: &FontManager::default(),
        };
        painter.fill_rect(0.0, 0.0, 1.0, 1.0, Color::BLACK);
        assert_eq!(painter.img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(painter.img.get_pixel(1, 1).0[3], 0);
    }
}
