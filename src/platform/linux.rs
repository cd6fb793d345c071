use super::ForegroundSource;
use crate::models::AppId;
use log::{debug, warn};
use std::time::Instant;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

/// Reads the active window's `WM_CLASS` from an X11 server.
pub struct X11Foreground {
    conn: RustConnection,
    root: Window,
    active_window_atom: u32,
}

impl X11Foreground {
    /// Connect to the display named by `$DISPLAY`. `None` without a usable X server.
    pub fn connect() -> Option<Self> {
        let (conn, screen_num) = match x11rb::connect(None) {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Could not connect to X server: {e}");
                return None;
            }
        };
        let root = conn.setup().roots.get(screen_num)?.root;
        let active_window_atom = conn
            .intern_atom(false, b"_NET_ACTIVE_WINDOW")
            .ok()?
            .reply()
            .ok()?
            .atom;

        Some(Self {
            conn,
            root,
            active_window_atom,
        })
    }

    fn active_window(&self) -> Option<Window> {
        let reply = self
            .conn
            .get_property(false, self.root, self.active_window_atom, AtomEnum::WINDOW, 0, 1)
            .ok()?
            .reply()
            .ok()?;

        let bytes: [u8; 4] = reply.value.get(..4)?.try_into().ok()?;
        let window = u32::from_ne_bytes(bytes);
        (window != x11rb::NONE).then_some(window)
    }

    fn window_class(&self, window: Window) -> Option<String> {
        let reply = self
            .conn
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 1024)
            .ok()?
            .reply()
            .ok()?;

        parse_wm_class(&reply.value)
    }
}

impl ForegroundSource for X11Foreground {
    fn resolve(&self, _now: Instant) -> Option<AppId> {
        let Some(window) = self.active_window() else {
            debug!("No active X11 window");
            return None;
        };
        self.window_class(window).map(AppId::new)
    }
}

/// `WM_CLASS` is `instance\0class\0`; the instance name is the stable identifier.
fn parse_wm_class(raw: &[u8]) -> Option<String> {
    raw.split(|b| *b == 0)
        .filter_map(|part| std::str::from_utf8(part).ok())
        .map(str::trim)
        .find(|part| !part.is_empty())
        .map(str::to_string)
}
