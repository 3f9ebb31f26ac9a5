// Screen capture and pointer injection behind traits, so the control loop
// can run against fakes in tests and against the real desktop in the binary.

#[cfg(feature = "desktop")]
pub mod desktop;
pub mod error;
pub mod types;

#[cfg(feature = "desktop")]
pub use desktop::{EnigoPointer, XcapScreen};
pub use error::{PlatformError, PlatformResult};
pub use types::{MouseButton, PointerInjector, ScreenCapture};
