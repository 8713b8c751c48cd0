//! LLM inference pipeline
//!
//! This module builds the llama.cpp command line for a prompt, runs it, and cleans up the output.

pub mod invocation;
pub mod runner;
pub mod sanitize;

pub use invocation::InvocationSpec;
pub use runner::{InvocationError, LocalProcessRunner, ModelRunner};
pub use sanitize::sanitize;
