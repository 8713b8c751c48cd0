//! Monsoon Library
//!
//! HTTP gateway that answers prompts by running a local llama.cpp binary.

pub mod api;
pub mod app;
pub mod error;
pub mod inference;
pub mod types;

pub use app::{router, AppState};
pub use error::{Error, Result};
