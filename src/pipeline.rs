//! Pipeline – paginates editor markup, builds the preview and exports it
//! as an image-based PDF in a single call.

use crate::config::AppConfig;
use crate::error::Result;
use crate::export::{render_pdf, ExportReport};
use crate::fonts::FontManager;
use crate::i18n::t;
use crate::measure::LayoutMeasurer;
use crate::paginate::{paginate, Pages};
use crate::preview::build_preview;
use crate::raster::BoxRasterizer;

/// Markup → page fragments, measured with the layout engine.
pub fn paginate_markup(markup: &str, config: &AppConfig) -> Pages {
    paginate_with_fonts(markup, config, FontManager::default())
}

fn paginate_with_fonts(markup: &str, config: &AppConfig, fonts: FontManager) -> Pages {
    let mut measurer = LayoutMeasurer::with_fonts(fonts);
    paginate(markup, config.page_width_px(), config.budget, &mut measurer)
}

/// Full pipeline: markup → PDF bytes, with the pages that were rendered.
pub fn generate_pdf(markup: &str, config: &AppConfig) -> Result<(Vec<u8>, Pages, ExportReport)> {
    generate_pdf_with_fonts(markup, config, FontManager::default())
}

/// As [`generate_pdf`], measuring and painting text with `fonts`.
pub fn generate_pdf_with_fonts(
    markup: &str,
    config: &AppConfig,
    fonts: FontManager,
) -> Result<(Vec<u8>, Pages, ExportReport)> {
    config.validate()?;
    let pages = paginate_with_fonts(markup, config, fonts.clone());
    let mut preview = build_preview(&pages, t(config.lang, "content_placeholder"));
    let mut rasterizer = BoxRasterizer::with_fonts(fonts, config.page_width_px());
    let (bytes, report) = render_pdf(&mut preview, &mut rasterizer, &config.export_options())?;
    Ok((bytes, pages, report))
}

/// Convenience: generate a PDF with the default config.
pub fn generate_pdf_from_html(markup: &str) -> Result<Vec<u8>> {
    let (bytes, _, _) = generate_pdf(markup, &AppConfig::default())?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::PageBudget;

    #[test]
    fn pipeline_basic() {
        let markup = "<h1>Hello</h1><p>World</p>";
        let (bytes, pages, report) = generate_pdf(markup, &AppConfig::default()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert_eq!(pages.count, 1);
        assert_eq!(report.page_count, 1);
        assert_eq!(report.byte_len, bytes.len());
    }

    #[test]
    fn empty_markup_renders_placeholder_page() {
        let (bytes, pages, _) = generate_pdf("", &AppConfig::default()).unwrap();
        assert!(pages.is_placeholder());
        assert!(!bytes.is_empty());
    }

    #[test]
    fn finite_budget_splits_long_markup() {
        let config = AppConfig {
            budget: PageBudget::a4_content(10.0),
            ..AppConfig::without_delays()
        };
        let markup = "<p>line</p>".repeat(60);
        let pages = paginate_markup(&markup, &config);
        assert!(pages.count > 1, "expected several pages, got {}", pages.count);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AppConfig {
            oversampling: 0.0,
            ..AppConfig::default()
        };
        assert!(generate_pdf("<p>x</p>", &config).is_err());
    }
}
