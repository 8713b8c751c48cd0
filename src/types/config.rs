//! Configuration types
//!
//! Server and inference configuration, resolved once from the environment at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Path to the inference binary, relative to the working directory
pub const ENV_BIN: &str = "LOCAL_LLM_BIN";
/// Path to the GGUF model, relative to the working directory
pub const ENV_MODEL: &str = "LOCAL_LLM_MODEL";
/// Path to the prompt template file, relative to the working directory
pub const ENV_PROMPT_FILE: &str = "LOCAL_LLM_PROMPT_FILE";
pub const ENV_GPU_LAYERS: &str = "LOCAL_LLM_NUM_GPU_LAYERS";
pub const ENV_THREADS: &str = "LOCAL_LLM_NUM_CPU_CORES";
pub const ENV_CONTEXT: &str = "LOCAL_LLM_CONTEXT";
/// Per-invocation timeout in seconds (0 or unset = wait forever)
pub const ENV_TIMEOUT_SECS: &str = "LOCAL_LLM_TIMEOUT_SECS";
pub const ENV_STATIC_DIR: &str = "LOCAL_LLM_STATIC_DIR";
pub const ENV_PORT: &str = "PORT";

const DEFAULT_THREADS: u32 = 4;
const DEFAULT_GPU_LAYERS: u32 = 0;
const DEFAULT_CONTEXT_SIZE: u32 = 2048;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "static";

/// Configuration errors
///
/// All of these are fatal: the server never starts with a bad configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for {var}: {value:?} is not a valid number")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must be relative to the working directory, got {value:?}")]
    AbsolutePath { var: &'static str, value: String },
    #[error("Cannot determine working directory: {0}")]
    WorkingDir(#[from] std::io::Error),
}

/// Immutable server configuration
///
/// Built once in `main` and shared read-only (behind an `Arc`) with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory every relative path below is resolved against
    pub working_dir: PathBuf,
    /// Inference binary, relative to `working_dir`
    pub bin: String,
    /// Model file, relative to `working_dir`
    pub model: String,
    /// Prompt template file, relative to `working_dir`
    pub prompt_file: String,
    /// Number of CPU threads (`-t`)
    pub threads: u32,
    /// Number of layers offloaded to the GPU (`-ngl`, 0 = CPU only)
    pub gpu_layers: u32,
    /// Context window size (`-c`)
    pub context_size: u32,
    /// HTTP listener port
    pub port: u16,
    /// Directory holding `index.html` and the `/static` assets
    pub static_dir: PathBuf,
    /// Upper bound on a single model invocation
    pub timeout: Option<Duration>,
}

impl Config {
    /// Resolve configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let working_dir = std::env::current_dir()?;
        Self::from_lookup(working_dir, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup
    pub fn from_lookup<F>(working_dir: impl Into<PathBuf>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let working_dir = working_dir.into();

        // Required paths are always prefixed with the working directory
        let relative = |var: &'static str| -> Result<String, ConfigError> {
            let value = lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(var))?;
            if Path::new(&value).has_root() {
                return Err(ConfigError::AbsolutePath { var, value });
            }
            Ok(value)
        };

        let bin = relative(ENV_BIN)?;
        let model = relative(ENV_MODEL)?;
        let prompt_file = relative(ENV_PROMPT_FILE)?;

        let threads = parse_or(&lookup, ENV_THREADS, DEFAULT_THREADS)?;
        let gpu_layers = parse_or(&lookup, ENV_GPU_LAYERS, DEFAULT_GPU_LAYERS)?;
        let context_size = parse_or(&lookup, ENV_CONTEXT, DEFAULT_CONTEXT_SIZE)?;
        let port = parse_or(&lookup, ENV_PORT, DEFAULT_PORT)?;

        let timeout = match parse_or(&lookup, ENV_TIMEOUT_SECS, 0u64)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let static_dir = lookup(ENV_STATIC_DIR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string());
        let static_dir = working_dir.join(static_dir);

        Ok(Self {
            working_dir,
            bin,
            model,
            prompt_file,
            threads,
            gpu_layers,
            context_size,
            port,
            static_dir,
            timeout,
        })
    }

    /// Absolute path of a configured relative path
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.working_dir.join(relative)
    }

    /// Path of the landing page template
    pub fn index_path(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset or blank
fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var).map(|v| v.trim().to_string()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var, value: v }),
    }
}
