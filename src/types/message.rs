//! Message types
//!
//! JSON bodies exchanged on `POST /run`.

use serde::{Deserialize, Serialize};

/// A prompt submitted by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Raw user prompt, forwarded verbatim to the model
    pub input: String,
}

/// The completion returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// The prompt as received
    pub input: String,
    /// Generated text with the echoed prompt removed
    pub response: String,
}
