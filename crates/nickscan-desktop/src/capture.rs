use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};
use nickscan_core::WindowSystem;
use nickscan_types::{CapturedImage, OcrRegion, WindowHandle, WindowRect};
use xcap::Window;

/// Window lookup and capture backed by xcap.
///
/// Handles are xcap window ids, which on Windows are the HWND value.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapWindows;

impl XcapWindows {
    pub fn new() -> Self {
        Self
    }
}

fn find_window(handle: WindowHandle) -> Result<Window> {
    let windows = Window::all().context("Failed to enumerate windows")?;
    windows
        .into_iter()
        .find(|w| u64::from(w.id()) == handle.0)
        .with_context(|| format!("Window {handle} not found"))
}

fn rect_of(handle: WindowHandle) -> Result<WindowRect> {
    let window = find_window(handle)?;
    if window.is_minimized() {
        bail!("Window {handle} is minimized");
    }
    Ok(WindowRect {
        x: window.x(),
        y: window.y(),
        width: window.width(),
        height: window.height(),
    })
}

fn capture(handle: WindowHandle, region: OcrRegion) -> Result<CapturedImage> {
    let window = find_window(handle)?;
    let image = window
        .capture_image()
        .with_context(|| format!("Failed to capture window {handle}"))?;

    let (x, y, w, h) = clamp_region(region, image.width(), image.height())
        .with_context(|| format!("Region {region:?} lies outside window {handle}"))?;

    let cropped = xcap::image::imageops::crop_imm(&image, x, y, w, h).to_image();
    Ok(CapturedImage {
        width: cropped.width(),
        height: cropped.height(),
        data: cropped.into_raw(),
    })
}

/// Intersect a window-relative region with the captured bounds
fn clamp_region(region: OcrRegion, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let left = i64::from(region.x).clamp(0, i64::from(width));
    let top = i64::from(region.y).clamp(0, i64::from(height));
    let right = (i64::from(region.x) + i64::from(region.w)).clamp(0, i64::from(width));
    let bottom = (i64::from(region.y) + i64::from(region.h)).clamp(0, i64::from(height));

    if right <= left || bottom <= top {
        return None;
    }
    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

#[cfg(windows)]
fn pointer_window() -> Option<(WindowHandle, String)> {
    crate::win32::window_under_cursor().map(|target| (target.handle, target.title))
}

#[cfg(not(windows))]
fn pointer_window() -> Option<(WindowHandle, String)> {
    tracing::debug!("pointer lookup is only available on Windows");
    None
}

pub fn encode_png(image: &CapturedImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            &image.data,
            image.width,
            image.height,
            ExtendedColorType::Rgba8,
        )
        .context("Failed to encode PNG")?;
    Ok(buffer)
}

#[async_trait]
impl WindowSystem for XcapWindows {
    fn window_under_pointer(&self) -> Option<(WindowHandle, String)> {
        pointer_window()
    }

    async fn window_rect(&self, handle: WindowHandle) -> Result<WindowRect> {
        tokio::task::spawn_blocking(move || rect_of(handle)).await?
    }

    async fn capture_region(
        &self,
        handle: WindowHandle,
        region: OcrRegion,
    ) -> Result<CapturedImage> {
        tokio::task::spawn_blocking(move || capture(handle, region)).await?
    }
}
