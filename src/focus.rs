//! Foreground-window lookup.
//!
//! Used for an informational log line before a typing run starts; the result
//! never gates emission.  Only Windows exposes a cheap, reliable query, so
//! other platforms report `None`.

/// Title of the currently focused window, when the platform can tell.
#[cfg(windows)]
pub fn foreground_window_title() -> Option<String> {
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

    // SAFETY: both calls are plain Win32 queries; the buffer outlives the
    // GetWindowTextW call and the returned length is bounded by its size.
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.0.is_null() {
            return None;
        }
        let mut buf = [0u16; 512];
        let len = GetWindowTextW(hwnd, &mut buf);
        if len <= 0 {
            return None;
        }
        Some(String::from_utf16_lossy(&buf[..len as usize]))
    }
}

/// Title of the currently focused window, when the platform can tell.
#[cfg(not(windows))]
pub fn foreground_window_title() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // Can't assert a concrete title in a headless test environment; the call
    // just has to be total.
    #[test]
    fn lookup_does_not_panic() {
        let _ = foreground_window_title();
    }
}
