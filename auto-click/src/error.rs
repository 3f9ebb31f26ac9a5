use crate::automation::TemplateError;
use crate::config::ConfigError;
use crate::platform::PlatformError;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Errors that stop the program before the control loop starts
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Templates(#[from] TemplateError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
