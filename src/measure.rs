//! Height measurement for pagination.
//!
//! The paginator never lays out markup itself. It asks a [`Measure`]
//! implementation how tall a run of blocks renders inside the preview chrome,
//! through a [`MeasurementSurface`] that is attached for the duration of one
//! pass and detached when it goes out of scope.

use crate::dom::parse_html;
use crate::error::{Error, Result};
use crate::fonts::FontManager;
use crate::layout::compute_layout;
use crate::style::build_styled_tree;

/// Something that can report the rendered height of editor markup.
pub trait Measure {
    /// Prepare the surface before the first measurement of a pass.
    fn attach(&mut self) -> Result<()> {
        Ok(())
    }

    /// Rendered height in CSS px of `markup` inside the preview chrome, on a
    /// surface `width` px wide.
    fn measure(&mut self, markup: &str, width: f32) -> Result<f32>;

    /// Tear the surface down. Called exactly once per successful `attach`.
    fn detach(&mut self) {}
}

/// Wrap block markup the way one preview page does, so the measured height
/// includes the page padding.
pub fn wrap_in_preview_chrome(markup: &str) -> String {
    format!(r#"<div class="p-8"><div class="ql-editor">{markup}</div></div>"#)
}

/// [`Measure`] backed by the layout engine.
pub struct LayoutMeasurer {
    fonts: FontManager,
    attached: bool,
}

impl LayoutMeasurer {
    pub fn new() -> Self {
        Self::with_fonts(FontManager::default())
    }

    pub fn with_fonts(fonts: FontManager) -> Self {
        Self {
            fonts,
            attached: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl Default for LayoutMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl Measure for LayoutMeasurer {
    fn attach(&mut self) -> Result<()> {
        self.attached = true;
        Ok(())
    }

    fn measure(&mut self, markup: &str, width: f32) -> Result<f32> {
        if !self.attached {
            return Err(Error::Measurement("surface is not attached".into()));
        }
        if width.is_nan() || width <= 0.0 {
            return Err(Error::Measurement(format!("invalid surface width {width}")));
        }
        let dom = parse_html(&wrap_in_preview_chrome(markup));
        let styled = build_styled_tree(&dom, None);
        let tree = compute_layout(&styled, width, &self.fonts)
            .map_err(|e| Error::Measurement(e.to_string()))?;
        Ok(tree.height)
    }

    fn detach(&mut self) {
        self.attached = false;
    }
}

/// Scoped measurement surface: attached on creation, detached on drop.
pub struct MeasurementSurface<'m, M: Measure + ?Sized> {
    measurer: &'m mut M,
    width: f32,
}

impl<'m, M: Measure + ?Sized> MeasurementSurface<'m, M> {
    pub fn open(measurer: &'m mut M, width: f32) -> Result<Self> {
        measurer.attach()?;
        log::debug!("Measurement surface attached ({width:.0}px wide)");
        Ok(Self { measurer, width })
    }

    pub fn measure(&mut self, markup: &str) -> Result<f32> {
        self.measurer.measure(markup, self.width)
    }
}

impl<M: Measure + ?Sized> Drop for MeasurementSurface<'_, M> {
    fn drop(&mut self) {
        self.measurer.detach();
        log::debug!("Measurement surface detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        attached: u32,
        detached: u32,
    }

    impl Measure for Counting {
        fn attach(&mut self) -> Result<()> {
            self.attached += 1;
            Ok(())
        }

        fn measure(&mut self, markup: &str, _width: f32) -> Result<f32> {
            Ok(markup.len() as f32)
        }

        fn detach(&mut self) {
            self.detached += 1;
        }
    }

    #[test]
    fn surface_detaches_on_drop() {
        let mut m = Counting::default();
        {
            let mut surface = MeasurementSurface::open(&mut m, 100.0).unwrap();
            assert_eq!(surface.measure("abc").unwrap(), 3.0);
        }
        assert_eq!((m.attached, m.detached), (1, 1));
    }

    #[test]
    fn layout_measurer_includes_chrome_padding() {
        let mut m = LayoutMeasurer::new();
        let mut surface = MeasurementSurface::open(&mut m, 794.0).unwrap();
        let empty = surface.measure("").unwrap();
        let one = surface.measure("<p>Hello</p>").unwrap();
        assert!((empty - 64.0).abs() < 0.01);
        assert!((one - (64.0 + 22.72)).abs() < 0.01);
    }

    #[test]
    fn detached_measurer_refuses() {
        let mut m = LayoutMeasurer::new();
        assert!(m.measure("<p>x</p>", 794.0).is_err());
        {
            let _surface = MeasurementSurface::open(&mut m, 794.0).unwrap();
        }
        assert!(!m.is_attached());
    }
}
