//! Invocation builder
//!
//! Turns the server configuration and a prompt into the exact command line
//! handed to the llama.cpp binary.

use crate::types::Config;
use std::path::PathBuf;

/// Reverse prompt that tells llama.cpp to stop at the next templated question
pub const STOP_MARKER: &str = "[Question]";

/// Sampling temperature, pinned to zero for deterministic decoding
pub const TEMPERATURE: &str = "0";

/// A fully resolved model invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    /// Absolute path of the inference binary
    pub binary: PathBuf,
    /// Arguments in the order they are passed, prompt last
    pub args: Vec<String>,
    /// The user prompt (also the final element of `args`)
    pub prompt: String,
}

impl InvocationSpec {
    /// Build the invocation for one prompt
    ///
    /// Produces `-m <model> -t <threads> --temp 0 -c <ctx> -ngl <layers>
    /// --file <prompt file> -r [Question] -p <input>`. The input is passed as
    /// its own argument, never spliced into a shell string, so it needs no
    /// escaping. Empty input is allowed.
    pub fn build(config: &Config, input: &str) -> Self {
        let model = config.resolve(&config.model);
        let prompt_file = config.resolve(&config.prompt_file);

        let args = vec![
            "-m".to_string(),
            model.to_string_lossy().into_owned(),
            "-t".to_string(),
            config.threads.to_string(),
            "--temp".to_string(),
            TEMPERATURE.to_string(),
            "-c".to_string(),
            config.context_size.to_string(),
            "-ngl".to_string(),
            config.gpu_layers.to_string(),
            "--file".to_string(),
            prompt_file.to_string_lossy().into_owned(),
            "-r".to_string(),
            STOP_MARKER.to_string(),
            "-p".to_string(),
            input.to_string(),
        ];

        Self {
            binary: config.resolve(&config.bin),
            args,
            prompt: input.to_string(),
        }
    }

    /// Human-readable command line, for logs only
    pub fn command_line(&self) -> String {
        let mut line = self.binary.display().to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push_str(&format!("{:?}", arg));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}
