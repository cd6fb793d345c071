pub mod reported;
pub mod types;

pub use reported::ReportedForeground;
pub use types::{FallbackForeground, ForegroundSource, NoForeground};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::X11Foreground;

use std::sync::Arc;

/// The best foreground source available on this machine.
///
/// Falls back to [`NoForeground`] when no native adapter can be set up; the
/// host can still drive the monitor through [`ReportedForeground`].
pub fn native_source() -> Arc<dyn ForegroundSource> {
    #[cfg(target_os = "linux")]
    if let Some(x11) = X11Foreground::connect() {
        return Arc::new(x11);
    }

    log::info!("No native foreground source available");
    Arc::new(NoForeground)
}
