// Collaborator seams for the control loop
use super::error::PlatformResult;
use image::RgbaImage;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Produces one frame of the screen per call
pub trait ScreenCapture {
    fn capture_screen(&mut self) -> PlatformResult<RgbaImage>;
}

/// Moves the OS pointer and clicks, in screen coordinates
pub trait PointerInjector {
    fn move_and_click(&mut self, x: i32, y: i32, button: MouseButton) -> PlatformResult<()>;
}
