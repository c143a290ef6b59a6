use std::sync::Arc;

use async_trait::async_trait;
use nickscan_types::{OcrRegion, Point, WindowHandle, WindowRect};

use crate::services::WindowSystem;

/// Where to look for the nickname inside a profile window
#[async_trait]
pub trait RegionStrategy: Send + Sync {
    async fn locate(
        &self,
        handle: WindowHandle,
        click: Option<Point>,
        fallback: OcrRegion,
    ) -> OcrRegion;
}

const CLICK_OFFSET_X: i32 = -50;
const CLICK_OFFSET_Y: i32 = -20;
const CLICK_WIDTH: u32 = 200;
const CLICK_HEIGHT: u32 = 40;

/// Fractions of the window size: x, y, w, h
const PROPORTIONS: (f64, f64, f64, f64) = (0.3, 0.2, 0.4, 0.1);

/// Fixed offsets tuned to the profile window layout of the supported client
pub struct ProportionalRegionLocator {
    window: Arc<dyn WindowSystem>,
}

impl ProportionalRegionLocator {
    pub fn new(window: Arc<dyn WindowSystem>) -> Self {
        Self { window }
    }

    /// The nick is rendered just around where the user clicked
    pub fn around_click(click: Point) -> OcrRegion {
        OcrRegion {
            x: click.x + CLICK_OFFSET_X,
            y: click.y + CLICK_OFFSET_Y,
            w: CLICK_WIDTH,
            h: CLICK_HEIGHT,
        }
    }

    pub fn from_geometry(rect: WindowRect) -> OcrRegion {
        let (fx, fy, fw, fh) = PROPORTIONS;
        let width = f64::from(rect.width);
        let height = f64::from(rect.height);

        OcrRegion {
            x: (width * fx).round() as i32,
            y: (height * fy).round() as i32,
            w: (width * fw).round() as u32,
            h: (height * fh).round() as u32,
        }
    }
}

#[async_trait]
impl RegionStrategy for ProportionalRegionLocator {
    async fn locate(
        &self,
        handle: WindowHandle,
        click: Option<Point>,
        fallback: OcrRegion,
    ) -> OcrRegion {
        if let Some(click) = click {
            return Self::around_click(click);
        }

        match self.window.window_rect(handle).await {
            Ok(rect) => Self::from_geometry(rect),
            Err(e) => {
                tracing::warn!(
                    %handle,
                    "window geometry unavailable, using fallback region: {e:#}"
                );
                fallback
            }
        }
    }
}
