pub mod config;
pub mod error;
pub mod model;
pub mod observability;
pub mod preprocessing;
pub mod server;
pub mod uploads;

#[cfg(test)]
mod integration_tests;

// Re-export common types
pub use error::{AppError, InferenceError, ProvisionError, UploadError};
