//! Core business logic module
//!
//! This module provides the core application layer including:
//! - Recipe service coordinating repositories and media
//! - Configuration management
//! - Structured logging system
//! - Error handling and type system
//! - Field validation
//! - Uploaded media storage

pub mod services;
pub mod config;
pub mod logging;
pub mod error;
pub mod validation;
pub mod media;

pub use services::RecipeService;
pub use config::Config;
pub use logging::Logger;
pub use error::{ApiError, ErrorResponse, Result, ErrorContext};
pub use media::MediaStore;
