//! Shared type definitions
//!
//! Configuration and the request/response bodies of the HTTP API.

pub mod config;
pub mod message;

pub use config::{Config, ConfigError};
pub use message::{InferenceRequest, InferenceResponse};
