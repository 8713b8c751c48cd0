//! Model invocation
//!
//! Runs the llama.cpp binary as a child process and collects its stdout as the completion.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::inference::InvocationSpec;

/// Maximum number of stderr bytes carried in an error
const STDERR_TAIL: usize = 2000;

/// Invocation errors
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Cannot start {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid model argument: {0}")]
    InvalidArgument(#[source] std::io::Error),
    #[error("Model process exited with {}: {stderr}", describe_exit(*code))]
    Exit { code: Option<i32>, stderr: String },
    #[error("Failed to read model output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Model process timed out after {0:?}")]
    Timeout(Duration),
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

/// Something that can turn an invocation into completion text
#[async_trait]
pub trait ModelRunner: Send + Sync {
    async fn run(&self, spec: &InvocationSpec) -> Result<String, InvocationError>;
}

/// Runs the configured binary as a local subprocess
///
/// One process per call, no retries. The child is killed if the calling
/// future is dropped or the timeout expires.
#[derive(Debug, Clone, Default)]
pub struct LocalProcessRunner {
    timeout: Option<Duration>,
}

impl LocalProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    async fn run_to_completion(
        &self,
        spec: &InvocationSpec,
    ) -> Result<std::process::Output, InvocationError> {
        let child = Command::new(&spec.binary)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| match source.kind() {
                // Raised before exec, e.g. a NUL byte inside the prompt
                ErrorKind::InvalidInput => InvocationError::InvalidArgument(source),
                _ => InvocationError::Spawn {
                    binary: spec.binary.clone(),
                    source,
                },
            })?;

        Ok(child.wait_with_output().await?)
    }
}

#[async_trait]
impl ModelRunner for LocalProcessRunner {
    async fn run(&self, spec: &InvocationSpec) -> Result<String, InvocationError> {
        tracing::debug!("Running model: {}", spec.command_line());
        let started = Instant::now();

        let result = match self.timeout {
            Some(limit) => match timeout(limit, self.run_to_completion(spec)).await {
                Ok(result) => result,
                Err(_) => Err(InvocationError::Timeout(limit)),
            },
            None => self.run_to_completion(spec).await,
        };

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Model invocation failed: {}", e);
                return Err(e);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let err = InvocationError::Exit {
                code: output.status.code(),
                stderr: tail(stderr.trim(), STDERR_TAIL).to_string(),
            };
            tracing::warn!("Model invocation failed: {}", err);
            return Err(err);
        }

        let completion = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::info!(
            "Model finished in {} ms ({} bytes of output)",
            started.elapsed().as_millis(),
            completion.len()
        );
        Ok(completion)
    }
}

/// Last `max_bytes` of `text`, cut on a char boundary
fn tail(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_short_text_untouched() {
        assert_eq!(tail("error", 100), "error");
    }

    #[test]
    fn test_tail_keeps_end_on_char_boundary() {
        let text = "ééééé";
        let cut = tail(text, 3);
        assert_eq!(cut, "é");
        assert_eq!(tail("abcdef", 2), "ef");
    }

    #[test]
    fn test_exit_error_message() {
        let err = InvocationError::Exit {
            code: Some(1),
            stderr: "error: unable to load model".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Model process exited with exit code 1: error: unable to load model"
        );

        let killed = InvocationError::Exit {
            code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("a signal"));
    }

    #[cfg(unix)]
    fn shell(script: &str, extra: &[&str]) -> InvocationSpec {
        let mut args = vec!["-c".to_string(), script.to_string(), "sh".to_string()];
        args.extend(extra.iter().map(|s| s.to_string()));
        InvocationSpec {
            binary: PathBuf::from("/bin/sh"),
            prompt: extra.last().map(|s| s.to_string()).unwrap_or_default(),
            args,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_completion() {
        let spec = shell(r#"printf '%s says hello' "$1""#, &["Bob"]);
        let out = LocalProcessRunner::default().run(&spec).await.unwrap();
        assert_eq!(out, "Bob says hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_arguments_passed_verbatim() {
        let spec = shell(r#"printf '%s|' "$@""#, &["-p", "a \"quoted\" $HOME prompt", ""]);
        let out = LocalProcessRunner::default().run(&spec).await.unwrap();
        assert_eq!(out, "-p|a \"quoted\" $HOME prompt||");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let spec = shell("echo 'failed to load model' >&2; exit 3", &[]);
        let err = LocalProcessRunner::default().run(&spec).await.unwrap_err();
        match &err {
            InvocationError::Exit { code, stderr } => {
                assert_eq!(*code, Some(3));
                assert_eq!(stderr, "failed to load model");
            }
            other => panic!("expected Exit, got {:?}", other),
        }
        assert!(err.to_string().contains("failed to load model"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let spec = InvocationSpec {
            binary: dir.path().join("no-such-llama"),
            args: vec!["-p".to_string(), "hi".to_string()],
            prompt: "hi".to_string(),
        };
        let err = LocalProcessRunner::default().run(&spec).await.unwrap_err();
        assert!(matches!(err, InvocationError::Spawn { .. }));
        assert!(err.to_string().contains("no-such-llama"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nul_in_prompt_is_invalid_argument() {
        let spec = shell("true", &["before\0after"]);
        let err = LocalProcessRunner::default().run(&spec).await.unwrap_err();
        assert!(matches!(err, InvocationError::InvalidArgument(_)), "{:?}", err);
        assert!(err.to_string().starts_with("Invalid model argument"));
        assert!(!err.to_string().contains("/bin/sh"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_enforced() {
        let spec = shell("sleep 5", &[]);
        let runner = LocalProcessRunner::new(Some(Duration::from_millis(100)));
        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, InvocationError::Timeout(_)));
    }
}
