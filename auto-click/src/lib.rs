pub mod args;
pub mod automation;
pub mod config;
pub mod error;
pub mod feature_matching;
pub mod platform;

#[cfg(test)]
pub(crate) mod test_support;

pub use automation::{ControlLoop, TemplateStore};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
