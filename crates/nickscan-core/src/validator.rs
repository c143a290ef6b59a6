use std::sync::Arc;

use nickscan_config::validator::ValidatorConfig;
use nickscan_types::WindowHandle;

use crate::services::{PatternService, WindowSystem};

/// Decides whether a window shows a single player's profile.
///
/// A window qualifies only if both the header colour and the circular avatar
/// heuristics pass. The two checks are independent and run concurrently.
pub struct ProfileWindowValidator {
    window: Arc<dyn WindowSystem>,
    patterns: Arc<dyn PatternService>,
}

impl ProfileWindowValidator {
    pub fn new(window: Arc<dyn WindowSystem>, patterns: Arc<dyn PatternService>) -> Self {
        Self { window, patterns }
    }

    pub async fn is_profile_window(
        &self,
        handle: WindowHandle,
        signature: &ValidatorConfig,
    ) -> bool {
        let image = match self.window.capture_region(handle, signature.sample_region).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(%handle, "profile sample capture failed: {e:#}");
                return false;
            }
        };

        let (header, avatar) = tokio::join!(
            self.patterns.color_match(
                &image,
                signature.header_color,
                signature.tolerance,
                signature.min_pixels,
            ),
            self.patterns.detect_circular_avatar(&image),
        );

        let header = header.unwrap_or_else(|e| {
            tracing::warn!(%handle, "header colour check failed: {e:#}");
            false
        });
        let avatar = avatar.unwrap_or_else(|e| {
            tracing::warn!(%handle, "avatar check failed: {e:#}");
            false
        });

        tracing::debug!(%handle, header, avatar, "profile heuristics evaluated");
        header && avatar
    }
}
