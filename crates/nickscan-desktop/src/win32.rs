use nickscan_types::{Point, WindowHandle};
use windows::Win32::Foundation::{HWND, POINT};
use windows::Win32::Graphics::Gdi::ScreenToClient;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, VK_RBUTTON};
use windows::Win32::UI::WindowsAndMessaging::{
    GA_ROOT, GetAncestor, GetCursorPos, GetWindowTextW, WindowFromPoint,
};

/// Top-level window under the cursor, with the cursor in its client coordinates
pub struct PointerTarget {
    pub handle: WindowHandle,
    pub title: String,
    pub client: Point,
}

pub fn right_button_down() -> bool {
    let state = unsafe { GetAsyncKeyState(i32::from(VK_RBUTTON.0)) };
    (state as u16 & 0x8000) != 0
}

pub fn window_under_cursor() -> Option<PointerTarget> {
    let mut point = POINT::default();
    unsafe { GetCursorPos(&mut point) }.ok()?;

    let hwnd = unsafe { WindowFromPoint(point) };
    if hwnd.is_invalid() {
        return None;
    }
    // xcap only enumerates top-level windows
    let root = unsafe { GetAncestor(hwnd, GA_ROOT) };
    let hwnd = if root.is_invalid() { hwnd } else { root };

    let mut client = point;
    let _ = unsafe { ScreenToClient(hwnd, &mut client) };

    Some(PointerTarget {
        handle: handle_of(hwnd),
        title: window_title(hwnd),
        client: Point {
            x: client.x,
            y: client.y,
        },
    })
}

fn window_title(hwnd: HWND) -> String {
    let mut buffer = [0u16; 512];
    let len = unsafe { GetWindowTextW(hwnd, &mut buffer) };
    String::from_utf16_lossy(&buffer[..len.max(0) as usize])
}

fn handle_of(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as usize as u64)
}
