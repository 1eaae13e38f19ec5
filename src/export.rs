//! Image-based PDF export of the rendered preview.
//!
//! The preview is switched into export mode for the duration of an
//! [`ExportSession`], rasterized at [`OVERSAMPLING`]× and embedded as a PNG
//! XObject on A4 pages with `printpdf` (v0.8 ops-based API).

use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use ::image::{imageops, ImageFormat, RgbaImage};
use printpdf::*;
use serde::{Deserialize, Serialize};

use crate::dom::{element_at_mut, find_by_class, DomNode, ElementNode, NodePath};
use crate::error::{Error, Result};
use crate::preview::EDITOR_CLASS;
use crate::raster::Rasterizer;
use crate::style::{EXPORT_MODE_CLASS, HIGHLIGHT_CLASS};
use crate::units::{mm_to_pt, A4_HEIGHT_MM, A4_WIDTH_MM};

/// File name the artifact is saved under.
pub const DEFAULT_FILE_NAME: &str = "document.pdf";

/// Device pixels per CSS px when rasterizing.
pub const OVERSAMPLING: f32 = 2.0;

/// Column properties cleared on every editor element while exporting.
const COLUMN_PROPERTIES: [&str; 3] = ["column-count", "column-gap", "column-fill"];

// ---------------------------------------------------------------------------
// Page geometry & placement
// ---------------------------------------------------------------------------

/// Sheet size and uniform margin, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl PageGeometry {
    pub fn a4(margin_mm: f32) -> Self {
        Self {
            width_mm: A4_WIDTH_MM,
            height_mm: A4_HEIGHT_MM,
            margin_mm,
        }
    }

    pub fn printable_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn printable_height(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4(10.0)
    }
}

/// Where the bitmap lands on the page, in millimetres from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// Fit an `img_w` × `img_h` bitmap into the printable area: full printable
/// width, unless the resulting height overflows, in which case full
/// printable height. The aspect ratio is always preserved.
pub fn compute_placement(img_w: u32, img_h: u32, page: &PageGeometry) -> Result<Placement> {
    if img_w == 0 || img_h == 0 {
        return Err(Error::Composition(format!("empty bitmap {img_w}x{img_h}")));
    }
    let (max_w, max_h) = (page.printable_width(), page.printable_height());
    if max_w <= 0.0 || max_h <= 0.0 {
        return Err(Error::Composition("margins leave no printable area".into()));
    }
    let (iw, ih) = (img_w as f32, img_h as f32);

    let mut width = max_w;
    let mut height = ih * width / iw;
    if height > max_h {
        height = max_h;
        width = iw * height / ih;
    }
    Ok(Placement {
        x_mm: page.margin_mm,
        y_mm: page.margin_mm,
        width_mm: width,
        height_mm: height,
    })
}

/// How the bitmap is distributed over PDF pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageComposition {
    /// The whole bitmap scaled onto one page.
    #[default]
    Fit,
    /// Full printable width, sliced into page-height bands. Each preview
    /// sheet is rasterized on its own canvas.
    Tile,
}

// ---------------------------------------------------------------------------
// Export session
// ---------------------------------------------------------------------------

/// Export-mode preprocessing of a preview tree, undone on drop.
///
/// While the session lives the root carries the export-mode class, editor
/// elements have no column styling and no element is highlighted. Dropping
/// the session restores exactly what it changed.
pub struct ExportSession<'a> {
    root: &'a mut ElementNode,
    marker_was_present: bool,
    editor_styles: Vec<(NodePath, Option<String>)>,
    highlights: Vec<NodePath>,
}

impl<'a> ExportSession<'a> {
    pub fn begin(root: &'a mut ElementNode) -> Self {
        let marker_was_present = root.has_class(EXPORT_MODE_CLASS);
        root.add_class(EXPORT_MODE_CLASS);

        let mut editor_styles = Vec::new();
        for path in find_by_class(root, EDITOR_CLASS) {
            if let Some(editor) = element_at_mut(root, &path) {
                let original = editor.attr("style").map(str::to_string);
                for prop in COLUMN_PROPERTIES {
                    if editor.style_property(prop).is_some() {
                        editor.set_style_property(prop, "");
                    }
                }
                editor_styles.push((path, original));
            }
        }

        let mut highlights = Vec::new();
        for path in find_by_class(root, HIGHLIGHT_CLASS) {
            if let Some(e) = element_at_mut(root, &path) {
                if e.remove_class(HIGHLIGHT_CLASS) {
                    highlights.push(path);
                }
            }
        }

        log::debug!(
            "Export session started ({} editors, {} highlights)",
            editor_styles.len(),
            highlights.len()
        );
        Self {
            root,
            marker_was_present,
            editor_styles,
            highlights,
        }
    }

    pub fn root(&self) -> &ElementNode {
        self.root
    }
}

impl Drop for ExportSession<'_> {
    fn drop(&mut self) {
        if !self.marker_was_present {
            self.root.remove_class(EXPORT_MODE_CLASS);
        }
        for (path, original) in &self.editor_styles {
            if let Some(editor) = element_at_mut(self.root, path) {
                match original {
                    Some(style) => editor.set_attr("style", style),
                    None => {
                        editor.remove_attr("style");
                    }
                }
            }
        }
        for path in &self.highlights {
            if let Some(e) = element_at_mut(self.root, path) {
                e.add_class(HIGHLIGHT_CLASS);
            }
        }
        log::debug!("Export session restored");
    }
}

// ---------------------------------------------------------------------------
// Artifact sinks
// ---------------------------------------------------------------------------

/// Destination for finished artifacts.
pub trait ArtifactSink {
    fn write_artifact(&mut self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes artifacts into a directory.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for FileSink {
    fn write_artifact(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(name);
        std::fs::write(&path, bytes)?;
        log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub artifacts: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn last(&self) -> Option<&(String, Vec<u8>)> {
        self.artifacts.last()
    }
}

impl ArtifactSink for MemorySink {
    fn write_artifact(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.artifacts.push((name.to_string(), bytes.to_vec()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub title: String,
    pub page: PageGeometry,
    pub oversampling: f32,
    pub composition: PageComposition,
    pub file_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: "Document".to_string(),
            page: PageGeometry::default(),
            oversampling: OVERSAMPLING,
            composition: PageComposition::Fit,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub file_name: String,
    pub page_count: usize,
    /// Widest bitmap by the summed height of all bitmaps.
    pub bitmap_size: (u32, u32),
    pub byte_len: usize,
}

/// Rasterize the preview in export mode and compose the PDF. The preview
/// is restored before this returns, whatever the outcome.
pub fn render_pdf<R: Rasterizer + ?Sized>(root: &mut ElementNode, rasterizer: &mut R, opts: &ExportOptions) -> Result<(Vec<u8>, ExportReport)> {
    let bitmaps = {
        let session = ExportSession::begin(root);
        match opts.composition {
            PageComposition::Fit => vec![rasterizer.rasterize(session.root(), opts.oversampling)?],
            PageComposition::Tile => rasterize_sheets(session.root(), rasterizer, opts.oversampling)?,
        }
    };
    let (bytes, page_count) = compose_pdf(&bitmaps, opts)?;
    let bitmap_size = bitmaps
        .iter()
        .fold((0, 0), |(w, h), b| (w.max(b.width()), h + b.height()));
    let report = ExportReport {
        file_name: opts.file_name.clone(),
        page_count,
        bitmap_size,
        byte_len: bytes.len(),
    };
    Ok((bytes, report))
}

/// One bitmap per sheet of the preview, each sheet wrapped in a copy of the
/// root so it is styled the same. A root without sheets is rasterized whole.
fn rasterize_sheets<R: Rasterizer + ?Sized>(root: &ElementNode, rasterizer: &mut R, scale: f32) -> Result<Vec<RgbaImage>> {
    let sheets: Vec<&ElementNode> = root.element_children().collect();
    if sheets.is_empty() {
        return Ok(vec![rasterizer.rasterize(root, scale)?]);
    }
    sheets
        .into_iter()
        .map(|sheet| {
            let single = ElementNode {
                tag: root.tag.clone(),
                attributes: root.attributes.clone(),
                children: vec![DomNode::Element(sheet.clone())],
            };
            rasterizer.rasterize(&single, scale)
        })
        .collect()
}

/// Export the preview and hand the PDF to `sink`.
pub fn export_preview<R, S>(root: &mut ElementNode, rasterizer: &mut R, sink: &mut S, opts: &ExportOptions) -> Result<ExportReport>
where
    R: Rasterizer + ?Sized,
    S: ArtifactSink + ?Sized,
{
    let (bytes, report) = render_pdf(root, rasterizer, opts)?;
    sink.write_artifact(&opts.file_name, &bytes)?;
    log::info!(
        "Exported {} ({} page(s), {}x{}px bitmap)",
        report.file_name,
        report.page_count,
        report.bitmap_size.0,
        report.bitmap_size.1
    );
    Ok(report)
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| Error::Composition(format!("PNG encode error: {e}")))?;
    Ok(buf)
}

/// Place the bitmaps according to the composition mode, in order. Returns
/// the PDF bytes and the number of pages.
pub fn compose_pdf(bitmaps: &[RgbaImage], opts: &ExportOptions) -> Result<(Vec<u8>, usize)> {
    let page = &opts.page;
    let mut bands: Vec<(Cow<'_, RgbaImage>, Placement)> = Vec::new();
    for img in bitmaps {
        let (img_w, img_h) = img.dimensions();
        match opts.composition {
            PageComposition::Fit => bands.push((Cow::Borrowed(img), compute_placement(img_w, img_h, page)?)),
            PageComposition::Tile => {
                if img_w == 0 || img_h == 0 {
                    return Err(Error::Composition(format!("empty bitmap {img_w}x{img_h}")));
                }
                let band_px = ((img_w as f32 * page.printable_height() / page.printable_width()).floor() as u32).max(1);
                let mut top = 0;
                while top < img_h {
                    let h = band_px.min(img_h - top);
                    let band = if h == img_h {
                        Cow::Borrowed(img)
                    } else {
                        Cow::Owned(imageops::crop_imm(img, 0, top, img_w, h).to_image())
                    };
                    let placement = Placement {
                        x_mm: page.margin_mm,
                        y_mm: page.margin_mm,
                        width_mm: page.printable_width(),
                        height_mm: h as f32 * page.printable_width() / img_w as f32,
                    };
                    bands.push((band, placement));
                    top += h;
                }
            }
        }
    }
    if bands.is_empty() {
        return Err(Error::Composition("no bitmap to place".into()));
    }

    let mut doc = PdfDocument::new(&opts.title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let page_h_pt = mm_to_pt(page.height_mm);
    let mut pages = Vec::with_capacity(bands.len());

    for (band, placement) in &bands {
        let png = encode_png(band)?;
        let raw = RawImage::decode_from_bytes(&png, &mut warnings)
            .map_err(|e| Error::Composition(format!("PDF image error: {e}")))?;
        let xobj_id = doc.add_image(&raw);

        // At 72 dpi one bitmap pixel is one point before scaling.
        let (bw, bh) = band.dimensions();
        let ops = vec![Op::UseXobject {
            id: xobj_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(mm_to_pt(placement.x_mm))),
                translate_y: Some(Pt(page_h_pt - mm_to_pt(placement.y_mm + placement.height_mm))),
                dpi: Some(72.0),
                scale_x: Some(mm_to_pt(placement.width_mm) / bw as f32),
                scale_y: Some(mm_to_pt(placement.height_mm) / bh as f32),
                rotate: None,
            },
        }];
        pages.push(PdfPage::new(Mm(page.width_mm), Mm(page.height_mm), ops));
    }
    for w in &warnings {
        log::debug!("printpdf: {w:?}");
    }

    let page_count = pages.len();
    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    Ok((bytes, page_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, Tag};
    use crate::preview::build_preview;
    use crate::paginate::Pages;

    fn solid(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, ::image::Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn wide_image_fills_printable_width() {
        let p = compute_placement(1000, 500, &PageGeometry::default()).unwrap();
        assert_eq!(p.width_mm, 190.0);
        assert_eq!(p.height_mm, 95.0);
        assert_eq!((p.x_mm, p.y_mm), (10.0, 10.0));
    }

    #[test]
    fn tall_image_fills_printable_height() {
        let p = compute_placement(1000, 4000, &PageGeometry::default()).unwrap();
        assert_eq!(p.height_mm, 277.0);
        assert!((p.width_mm - 69.25).abs() < 0.001);
    }

    #[test]
    fn empty_bitmap_is_a_composition_error() {
        assert!(matches!(
            compute_placement(0, 10, &PageGeometry::default()),
            Err(Error::Composition(_))
        ));
    }

    #[test]
    fn session_restores_preview() {
        let mut root = build_preview(
            &Pages {
                pages: vec![r#"<p data-block-id="blk-0">a</p>"#.into()],
                count: 1,
            },
            "",
        );
        let editor = find_by_class(&root, EDITOR_CLASS)[0].clone();
        element_at_mut(&mut root, &editor)
            .unwrap()
            .set_style_property("column-count", "2");
        crate::preview::highlight_block(&mut root, "blk-0");
        let before = root.clone();

        {
            let session = ExportSession::begin(&mut root);
            let r = session.root();
            assert!(r.has_class(EXPORT_MODE_CLASS));
            assert!(find_by_class(r, HIGHLIGHT_CLASS).is_empty());
            let ed = crate::dom::element_at(r, &editor).unwrap();
            assert_eq!(ed.style_property("column-count"), None);
        }
        assert_eq!(root, before);
    }

    #[test]
    fn session_keeps_existing_marker() {
        let mut root = ElementNode::with_class(Tag::Div, EXPORT_MODE_CLASS);
        root.children = parse_html("<p>x</p>");
        {
            let _session = ExportSession::begin(&mut root);
        }
        assert!(root.has_class(EXPORT_MODE_CLASS));
    }

    #[test]
    fn fit_produces_one_page() {
        let (bytes, pages) = compose_pdf(&[solid(40, 400)], &ExportOptions::default()).unwrap();
        assert_eq!(pages, 1);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn tile_slices_tall_bitmaps() {
        let opts = ExportOptions {
            composition: PageComposition::Tile,
            ..Default::default()
        };
        // band height = floor(190 × 277 / 190) = 277px at 190px wide
        let (_, pages) = compose_pdf(&[solid(190, 600)], &opts).unwrap();
        assert_eq!(pages, 3);
    }

    #[test]
    fn tile_bands_each_bitmap_separately() {
        let opts = ExportOptions {
            composition: PageComposition::Tile,
            ..Default::default()
        };
        // 277px bands at 190px wide: only the 300px bitmap needs two pages
        let (_, pages) = compose_pdf(&[solid(190, 200), solid(190, 200), solid(190, 300)], &opts).unwrap();
        assert_eq!(pages, 4);
    }

    #[test]
    fn no_bitmaps_is_a_composition_error() {
        assert!(matches!(
            compose_pdf(&[], &ExportOptions::default()),
            Err(Error::Composition(_))
        ));
    }

    struct CountingRasterizer {
        sheets_per_call: Vec<usize>,
    }

    impl Rasterizer for CountingRasterizer {
        fn rasterize(&mut self, root: &ElementNode, _scale: f32) -> Result<RgbaImage> {
            self.sheets_per_call.push(root.element_children().count());
            Ok(solid(100, 50))
        }
    }

    #[test]
    fn tile_rasterizes_sheet_by_sheet() {
        let mut root = build_preview(
            &Pages {
                pages: vec!["<p>a</p>".into(), "<p>b</p>".into(), "<p>c</p>".into()],
                count: 3,
            },
            "",
        );
        let opts = ExportOptions {
            composition: PageComposition::Tile,
            ..Default::default()
        };
        let mut rasterizer = CountingRasterizer { sheets_per_call: Vec::new() };
        let (_, report) = render_pdf(&mut root, &mut rasterizer, &opts).unwrap();
        assert_eq!(rasterizer.sheets_per_call, vec![1, 1, 1]);
        assert_eq!(report.page_count, 3);
        assert_eq!(report.bitmap_size, (100, 150));

        let mut rasterizer = CountingRasterizer { sheets_per_call: Vec::new() };
        render_pdf(&mut root, &mut rasterizer, &ExportOptions::default()).unwrap();
        assert_eq!(rasterizer.sheets_per_call, vec![3]);
    }

    #[test]
    fn memory_sink_records_artifacts() {
        let mut sink = MemorySink::default();
        sink.write_artifact(DEFAULT_FILE_NAME, b"%PDF").unwrap();
        assert_eq!(sink.last().unwrap().0, "document.pdf");
    }
}
