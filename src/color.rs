use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Label colours: label name → Color32
// ---------------------------------------------------------------------------

/// Assigns each declared label a distinct colour for markers and the legend.
#[derive(Debug, Clone, Default)]
pub struct LabelColors {
    mapping: BTreeMap<String, Color32>,
}

impl LabelColors {
    pub fn new<'a>(labels: impl Iterator<Item = &'a str>) -> Self {
        let names: Vec<&str> = labels.collect();
        let mapping = names
            .iter()
            .zip(generate_palette(names.len()))
            .map(|(name, color)| (name.to_string(), color))
            .collect();
        Self { mapping }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.mapping.contains_key(label)
    }

    /// Colour for a label; grey for labels declared after the map was built.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping.get(label).copied().unwrap_or(Color32::GRAY)
    }
}
