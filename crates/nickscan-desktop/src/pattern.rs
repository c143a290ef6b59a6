use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use nickscan_core::{PatternService, WindowSystem};
use nickscan_types::{CapturedImage, OcrRegion, Rgb, WindowHandle};

use crate::capture::encode_png;
use crate::ocr::OcrReader;

/// Angles sampled around each candidate circle
const RING_SAMPLES: usize = 24;
/// Samples that must show an edge for a candidate to count as a circle
const RING_MIN_EDGES: usize = 23;
/// Distance of the inner/outer sample rings from the candidate radius
const RING_OFFSET: f64 = 3.0;
/// Luma difference that counts as an edge
const EDGE_CONTRAST: f64 = 40.0;
const MIN_RADIUS: u32 = 8;
const CENTER_STEP: usize = 2;

/// Pixels within `tolerance` of `reference` on every channel
pub fn count_matching_pixels(image: &CapturedImage, reference: Rgb, tolerance: u8) -> u32 {
    let close = |a: u8, b: u8| a.abs_diff(b) <= tolerance;
    image
        .data
        .chunks_exact(4)
        .filter(|px| {
            close(px[0], reference.r) && close(px[1], reference.g) && close(px[2], reference.b)
        })
        .count() as u32
}

/// Look for a round, high-contrast outline such as a profile avatar.
///
/// Every candidate centre and radius is tested by probing just inside and just
/// outside the ring; a circle shows a luma edge at nearly every angle while
/// rectangles and text do not. Returns the first hit as `(cx, cy, r)`.
pub fn find_circular_avatar(image: &CapturedImage) -> Option<(u32, u32, u32)> {
    let max_radius = image.width.min(image.height) / 2;
    if max_radius < MIN_RADIUS + RING_OFFSET as u32 {
        return None;
    }

    let directions: Vec<(f64, f64)> = (0..RING_SAMPLES)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / RING_SAMPLES as f64;
            (angle.cos(), angle.sin())
        })
        .collect();

    for radius in MIN_RADIUS..=max_radius - RING_OFFSET as u32 {
        let reach = radius + RING_OFFSET as u32 + 1;
        if reach * 2 > image.width.min(image.height) {
            break;
        }
        for cy in (reach..image.height - reach).step_by(CENTER_STEP) {
            for cx in (reach..image.width - reach).step_by(CENTER_STEP) {
                if is_ring(image, cx, cy, radius, &directions) {
                    return Some((cx, cy, radius));
                }
            }
        }
    }
    None
}

fn is_ring(
    image: &CapturedImage,
    cx: u32,
    cy: u32,
    radius: u32,
    directions: &[(f64, f64)],
) -> bool {
    let r = f64::from(radius);
    let mut edges = 0;

    for (i, (dx, dy)) in directions.iter().enumerate() {
        let inner = luma_at(image, cx, cy, dx * (r - RING_OFFSET), dy * (r - RING_OFFSET));
        let outer = luma_at(image, cx, cy, dx * (r + RING_OFFSET), dy * (r + RING_OFFSET));
        if let (Some(inner), Some(outer)) = (inner, outer)
            && (inner - outer).abs() >= EDGE_CONTRAST
        {
            edges += 1;
        }
        // Bail out as soon as too many angles have missed
        if (i + 1) - edges > RING_SAMPLES - RING_MIN_EDGES {
            return false;
        }
    }
    edges >= RING_MIN_EDGES
}

fn luma_at(image: &CapturedImage, cx: u32, cy: u32, dx: f64, dy: f64) -> Option<f64> {
    let x = (f64::from(cx) + dx).round();
    let y = (f64::from(cy) + dy).round();
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let px = image.pixel(x as u32, y as u32)?;
    Some(0.299 * f64::from(px.r) + 0.587 * f64::from(px.g) + 0.114 * f64::from(px.b))
}

/// Pixel heuristics plus OCR over captured window regions
pub struct DesktopPatterns {
    window: Arc<dyn WindowSystem>,
    ocr: OcrReader,
}

impl DesktopPatterns {
    pub fn new(window: Arc<dyn WindowSystem>, ocr: OcrReader) -> Self {
        Self { window, ocr }
    }
}

#[async_trait]
impl PatternService for DesktopPatterns {
    async fn color_match(
        &self,
        image: &CapturedImage,
        reference: Rgb,
        tolerance: u8,
        min_pixels: u32,
    ) -> Result<bool> {
        let image = image.clone();
        let matching = tokio::task::spawn_blocking(move || {
            count_matching_pixels(&image, reference, tolerance)
        })
        .await?;
        tracing::trace!(matching, min_pixels, "header colour pixels");
        Ok(matching >= min_pixels)
    }

    async fn detect_circular_avatar(&self, image: &CapturedImage) -> Result<bool> {
        let image = image.clone();
        let found = tokio::task::spawn_blocking(move || find_circular_avatar(&image)).await?;
        if let Some((cx, cy, r)) = found {
            tracing::trace!(cx, cy, r, "avatar ring found");
        }
        Ok(found.is_some())
    }

    async fn extract_text(&self, handle: WindowHandle, region: OcrRegion) -> Result<String> {
        let image = self.window.capture_region(handle, region).await?;
        let png = encode_png(&image)?;
        self.ocr.recognize(png).await
    }
}
