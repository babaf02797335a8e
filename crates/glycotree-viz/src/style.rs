use std::path::Path;

use plotters::drawing::DrawingAreaErrorKind;
use plotters::style::RGBColor;

use crate::VizError;

pub(crate) type DrawResult<T = ()> = Result<T, DrawingAreaErrorKind<std::io::Error>>;

pub(crate) const FONT: &str = "sans-serif";
pub(crate) const CURVE: RGBColor = RGBColor(31, 119, 180);
pub(crate) const REFERENCE: RGBColor = RGBColor(150, 150, 150);
pub(crate) const BAR: RGBColor = RGBColor(44, 160, 44);

/// Per-class node hues: orange for class 0, blue for class 1.
pub(crate) const CLASS_COLORS: [RGBColor; 4] = [
    RGBColor(229, 129, 57),
    RGBColor(57, 157, 229),
    RGBColor(129, 229, 57),
    RGBColor(229, 57, 157),
];

/// Mix `color` with white; `alpha` 0 is white, 1 is `color`.
pub(crate) fn tint(color: RGBColor, alpha: f64) -> RGBColor {
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |c: u8| (255.0 + (f64::from(c) - 255.0) * alpha).round() as u8;
    RGBColor(mix(color.0), mix(color.1), mix(color.2))
}

pub(crate) fn render_err(path: &Path, err: &DrawingAreaErrorKind<std::io::Error>) -> VizError {
    VizError::Render {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_endpoints() {
        let c = RGBColor(57, 157, 229);
        assert_eq!(tint(c, 0.0), RGBColor(255, 255, 255));
        assert_eq!(tint(c, 1.0), c);
        assert_eq!(tint(c, 2.0), c);
    }
}
