use nickscan_types::{OcrRegion, Rgb};
use serde::{Deserialize, Serialize};

fn default_sample_region() -> OcrRegion {
    OcrRegion {
        x: 0,
        y: 0,
        w: 400,
        h: 100,
    }
}

fn default_header_color() -> Rgb {
    Rgb::new(0, 80, 140)
}

fn default_tolerance() -> u8 {
    30
}

fn default_min_pixels() -> u32 {
    1000
}

/// Visual signature of a profile window header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Top strip of the window captured for classification
    #[serde(default = "default_sample_region")]
    pub sample_region: OcrRegion,
    #[serde(default = "default_header_color")]
    pub header_color: Rgb,
    /// Max per-channel distance from `header_color`
    #[serde(default = "default_tolerance")]
    pub tolerance: u8,
    #[serde(default = "default_min_pixels")]
    pub min_pixels: u32,
    /// Title fragments (case-insensitive) of windows whose right-clicks are
    /// analysed; empty accepts every window
    pub window_titles: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            sample_region: default_sample_region(),
            header_color: default_header_color(),
            tolerance: default_tolerance(),
            min_pixels: default_min_pixels(),
            window_titles: Vec::new(),
        }
    }
}
