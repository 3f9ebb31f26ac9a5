// Desktop backend: xcap for screen capture, enigo for pointer input

use super::error::{PlatformError, PlatformResult};
use super::types::{MouseButton, PointerInjector, ScreenCapture};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use image::RgbaImage;
use std::time::Duration;
use xcap::Monitor;

/// Pause between moving the pointer and pressing the button
const SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Captures the primary monitor
pub struct XcapScreen {
    monitor: Monitor,
}

impl XcapScreen {
    /// Pick the primary monitor, or the first one reported
    pub fn primary() -> PlatformResult<Self> {
        let monitors = Monitor::all().map_err(|e| PlatformError::CaptureFailed {
            description: e.to_string(),
        })?;

        let primary = monitors
            .iter()
            .position(|m| m.is_primary().unwrap_or(false))
            .unwrap_or(0);
        let monitor = monitors
            .into_iter()
            .nth(primary)
            .ok_or(PlatformError::NoMonitor)?;

        if let (Ok(name), Ok(width), Ok(height)) = (monitor.name(), monitor.width(), monitor.height()) {
            log::info!("🖥️ Capturing monitor '{name}' ({width}x{height})");
        }
        Ok(Self { monitor })
    }
}

impl ScreenCapture for XcapScreen {
    fn capture_screen(&mut self) -> PlatformResult<RgbaImage> {
        let frame = self
            .monitor
            .capture_image()
            .map_err(|e| PlatformError::CaptureFailed {
                description: e.to_string(),
            })?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(PlatformError::EmptyCapture {
                width: frame.width(),
                height: frame.height(),
            });
        }
        Ok(frame)
    }
}

/// Injects clicks through the OS input APIs
pub struct EnigoPointer {
    enigo: Enigo,
}

impl EnigoPointer {
    pub fn new() -> PlatformResult<Self> {
        let enigo = Enigo::new(&Settings::default()).map_err(|e| PlatformError::PointerUnavailable {
            description: e.to_string(),
        })?;
        Ok(Self { enigo })
    }
}

impl From<MouseButton> for Button {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        }
    }
}

impl PointerInjector for EnigoPointer {
    fn move_and_click(&mut self, x: i32, y: i32, button: MouseButton) -> PlatformResult<()> {
        let failed = |e: enigo::InputError| PlatformError::PointerFailed {
            x,
            y,
            description: e.to_string(),
        };
        self.enigo.move_mouse(x, y, Coordinate::Abs).map_err(failed)?;
        std::thread::sleep(SETTLE_DELAY);
        self.enigo.button(button.into(), Direction::Click).map_err(failed)?;
        Ok(())
    }
}
