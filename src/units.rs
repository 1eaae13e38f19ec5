//! Length conversions between CSS pixels, millimetres and PDF points.
//!
//! Layout works in CSS px (96 per inch), page composition in millimetres
//! and printpdf placement in points (72 per inch).

/// CSS pixels per millimetre.
pub const PX_PER_MM: f32 = 96.0 / 25.4;

/// PDF points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// A4 portrait sheet.
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

pub fn mm_to_px(mm: f32) -> f32 {
    mm * PX_PER_MM
}

pub fn px_to_mm(px: f32) -> f32 {
    px / PX_PER_MM
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Resolve a CSS length to px. `em` is relative to `font_size`, `%` to
/// `percent_base`. Returns `None` for `auto` and anything unparseable.
pub fn parse_length(value: &str, font_size: f32, percent_base: f32) -> Option<f32> {
    let v = value.trim().to_ascii_lowercase();
    let (num, factor) = if let Some(n) = v.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = v.strip_suffix("rem") {
        (n, 16.0)
    } else if let Some(n) = v.strip_suffix("em") {
        (n, font_size)
    } else if let Some(n) = v.strip_suffix("pt") {
        (n, 96.0 / 72.0)
    } else if let Some(n) = v.strip_suffix("mm") {
        (n, PX_PER_MM)
    } else if let Some(n) = v.strip_suffix("cm") {
        (n, PX_PER_MM * 10.0)
    } else if let Some(n) = v.strip_suffix('%') {
        (n, percent_base / 100.0)
    } else {
        (v.as_str(), 1.0)
    };
    num.trim().parse::<f32>().ok().map(|n| n * factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_height_in_px_matches_css() {
        assert_eq!(mm_to_px(A4_HEIGHT_MM).round(), 1123.0);
        assert_eq!(mm_to_px(A4_WIDTH_MM).round(), 794.0);
    }

    #[test]
    fn parses_common_units() {
        assert_eq!(parse_length("12px", 16.0, 0.0), Some(12.0));
        assert_eq!(parse_length("1.5em", 20.0, 0.0), Some(30.0));
        assert_eq!(parse_length("50%", 16.0, 200.0), Some(100.0));
        assert_eq!(parse_length("0", 16.0, 0.0), Some(0.0));
        assert_eq!(parse_length("auto", 16.0, 0.0), None);
    }
}
