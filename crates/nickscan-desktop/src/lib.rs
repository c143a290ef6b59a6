//! OS-facing implementations of the detector's service traits

mod capture;
#[cfg(windows)]
mod com;
mod hotkey;
mod ocr;
mod pattern;
mod right_click;
#[cfg(windows)]
mod win32;

pub use capture::{XcapWindows, encode_png};
#[cfg(windows)]
pub use com::ComGuard;
pub use hotkey::GlobalHotkeys;
pub use ocr::OcrReader;
pub use pattern::{DesktopPatterns, count_matching_pixels, find_circular_avatar};
pub use right_click::{RightClickHook, TitleFilter};
