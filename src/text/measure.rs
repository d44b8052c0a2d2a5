//! The font measurement oracle.
//!
//! Layout needs word widths, but shaping belongs to the rendering subsystem.
//! The engine therefore calls through this trait synchronously; hosts hand in
//! a platform text shaper, tests a deterministic stub.

use crate::scene::FontSpec;

/// Measures text synchronously in the given font.
pub trait TextMeasurer {
    /// Width of `text` in pixels.
    fn measure_text(&self, text: &str, font: &FontSpec) -> f64;
}

/// Average-advance metrics: every character advances a fixed fraction of the
/// font size, slightly wider when bold.
#[derive(Debug, Clone, Copy)]
pub struct AvgAdvanceMeasurer {
    pub advance_ratio: f64,
}

impl Default for AvgAdvanceMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: 0.5,
        }
    }
}

impl TextMeasurer for AvgAdvanceMeasurer {
    fn measure_text(&self, text: &str, font: &FontSpec) -> f64 {
        let weight_factor = if font.weight == "bold" { 1.05 } else { 1.0 };
        text.chars().count() as f64 * font.size * self.advance_ratio * weight_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avg_advance_scales_with_size() {
        let measurer = AvgAdvanceMeasurer::default();
        let font = FontSpec {
            size: 20.0,
            ..FontSpec::default()
        };
        assert_eq!(measurer.measure_text("abcd", &font), 40.0);
    }

    #[test]
    fn test_bold_measures_wider() {
        let measurer = AvgAdvanceMeasurer::default();
        let regular = FontSpec {
            size: 20.0,
            ..FontSpec::default()
        };
        let bold = FontSpec {
            weight: "bold".to_string(),
            ..regular.clone()
        };
        assert!(measurer.measure_text("abcd", &bold) > measurer.measure_text("abcd", &regular));
    }
}
