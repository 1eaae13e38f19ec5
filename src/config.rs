//! Application config – page geometry, pagination budget, export options
//! and command timings, loadable from JSON with every field defaulted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::export::{ExportOptions, PageComposition, PageGeometry, DEFAULT_FILE_NAME, OVERSAMPLING};
use crate::i18n::Lang;
use crate::paginate::PageBudget;
use crate::units::{mm_to_px, A4_HEIGHT_MM, A4_WIDTH_MM};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub budget: PageBudget,
    /// Device pixels per CSS px when rasterizing for export.
    pub oversampling: f32,
    pub composition: PageComposition,
    pub export_file_name: String,
    /// Artificial delay after a save, in milliseconds.
    pub save_delay_ms: u64,
    pub reset_delay_ms: u64,
    /// Quiet window before a resize re-paginates.
    pub resize_debounce_ms: u64,
    pub lang: Lang,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Document".to_string(),
            page_width_mm: A4_WIDTH_MM,
            page_height_mm: A4_HEIGHT_MM,
            margin_mm: 10.0,
            budget: PageBudget::Unbounded,
            oversampling: OVERSAMPLING,
            composition: PageComposition::Fit,
            export_file_name: DEFAULT_FILE_NAME.to_string(),
            save_delay_ms: 850,
            reset_delay_ms: 700,
            resize_debounce_ms: 150,
            lang: Lang::Ko,
        }
    }
}

impl AppConfig {
    /// Defaults with all artificial delays removed.
    pub fn without_delays() -> Self {
        Self {
            save_delay_ms: 0,
            reset_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialise from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_width_mm <= 0.0 || self.page_height_mm <= 0.0 {
            return Err(Error::Config("page size must be positive".into()));
        }
        if self.margin_mm < 0.0
            || 2.0 * self.margin_mm >= self.page_width_mm
            || 2.0 * self.margin_mm >= self.page_height_mm
        {
            return Err(Error::Config(format!(
                "margin {}mm leaves no printable area",
                self.margin_mm
            )));
        }
        if !self.oversampling.is_finite() || self.oversampling <= 0.0 {
            return Err(Error::Config("oversampling must be positive".into()));
        }
        if let PageBudget::Finite(px) = self.budget {
            if !px.is_finite() || px <= 0.0 {
                return Err(Error::Config("finite budget must be positive".into()));
            }
        }
        if self.export_file_name.trim().is_empty() {
            return Err(Error::Config("export file name is empty".into()));
        }
        Ok(())
    }

    /// Page width in CSS px, the width of the measurement surface and of the
    /// rasterized preview.
    pub fn page_width_px(&self) -> f32 {
        mm_to_px(self.page_width_mm).round()
    }

    pub fn page_geometry(&self) -> PageGeometry {
        PageGeometry {
            width_mm: self.page_width_mm,
            height_mm: self.page_height_mm,
            margin_mm: self.margin_mm,
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            title: self.title.clone(),
            page: self.page_geometry(),
            oversampling: self.oversampling,
            composition: self.composition,
            file_name: self.export_file_name.clone(),
        }
    }

    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AppConfig::default();
        assert_eq!(c.page_width_px(), 794.0);
        assert_eq!(c.budget, PageBudget::Unbounded);
        assert_eq!(c.export_file_name, "document.pdf");
        assert_eq!(c.save_delay(), Duration::from_millis(850));
        assert_eq!(c.lang, Lang::Ko);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = AppConfig::from_json(r#"{"budget": {"finite": 1000}, "lang": "en", "composition": "tile"}"#).unwrap();
        assert_eq!(c.budget, PageBudget::Finite(1000.0));
        assert_eq!(c.lang, Lang::En);
        assert_eq!(c.composition, PageComposition::Tile);
        assert_eq!(c.margin_mm, 10.0);
    }

    #[test]
    fn json_round_trip() {
        let c = AppConfig::without_delays();
        let back = AppConfig::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn rejects_oversized_margin() {
        assert!(matches!(
            AppConfig::from_json(r#"{"margin_mm": 150}"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn rejects_unknown_language() {
        assert!(AppConfig::from_json(r#"{"lang": "fr"}"#).is_err());
    }
}
