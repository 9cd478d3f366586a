// Child process runner shared by the media adapters
// reason: tokio::process keeps yt-dlp / ffmpeg off the runtime threads
use std::collections::HashMap;
use std::ffi::OsStr;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use guildtune_core::port::TimeProvider;

/// Environment variables passed through to child processes
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "XDG_CACHE_HOME"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Spawn of {program} failed: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("{program} timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("{program} exited with {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(String),
}

/// Captured output of a successful run
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: i64,
}

/// Runs external programs with an allowlisted environment
///
/// Children are killed when their future is dropped, so an abandoned
/// playback or a timeout never leaves a stray process behind.
#[derive(Clone)]
pub struct ProcessRunner {
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
}

impl ProcessRunner {
    /// Create a new runner
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    /// * `env_allowlist` - Environment variables visible to children
    pub fn new(time_provider: Arc<dyn TimeProvider>, env_allowlist: Vec<String>) -> Self {
        Self {
            time_provider,
            env_allowlist,
        }
    }

    pub fn with_default_env(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::new(
            time_provider,
            DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Filter the current environment to the allowlist
    fn filter_env(&self, env: &HashMap<String, String>) -> HashMap<String, String> {
        env.iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Run `program` to completion and capture its output
    ///
    /// # Errors
    /// - ProcessError::SpawnFailed if the program cannot be started
    /// - ProcessError::Timeout if `limit` elapses first
    /// - ProcessError::Failed on a non-zero exit status
    pub async fn run<I, S>(
        &self,
        program: &str,
        args: I,
        limit: Option<Duration>,
    ) -> Result<ProcessOutput, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let start_time = self.time_provider.now_millis();
        let env: HashMap<String, String> = std::env::vars().collect();

        let mut command = Command::new(program);
        command
            .args(args)
            .env_clear()
            .envs(self.filter_env(&env))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = ?command.as_std(), "Spawning child process");

        let child = command.spawn().map_err(|e| ProcessError::SpawnFailed {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

        let output = match limit {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(result) => result.map_err(|e| ProcessError::Io(e.to_string()))?,
                Err(_) => {
                    return Err(ProcessError::Timeout {
                        program: program.to_string(),
                        timeout_ms: limit.as_millis() as u64,
                    })
                }
            },
            None => child
                .wait_with_output()
                .await
                .map_err(|e| ProcessError::Io(e.to_string()))?,
        };

        let duration_ms = self.time_provider.now_millis() - start_time;
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(ProcessError::Failed {
                program: program.to_string(),
                code: output.status.code(),
                stderr: last_line(&stderr),
            });
        }

        info!(
            program = %program,
            duration_ms = %duration_ms,
            "Child process completed"
        );

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr,
            duration_ms,
        })
    }
}

/// Last non-empty line of a tool's stderr (ffmpeg and yt-dlp put the cause there)
fn last_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use guildtune_core::port::time_provider::SystemTimeProvider;

    fn runner() -> ProcessRunner {
        ProcessRunner::with_default_env(Arc::new(SystemTimeProvider))
    }

    #[tokio::test]
    async fn test_run_success() {
        let output = runner().run("echo", ["hello"], None).await.unwrap();
        assert!(output.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let result = runner()
            .run("sleep", ["10"], Some(Duration::from_millis(100)))
            .await;
        assert!(matches!(result, Err(ProcessError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_run_non_zero_exit() {
        let result = runner()
            .run("sh", ["-c", "echo boom >&2; exit 3"], None)
            .await;
        match result {
            Err(ProcessError::Failed { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let result = runner()
            .run("guildtune-definitely-missing", Vec::<String>::new(), None)
            .await;
        assert!(matches!(result, Err(ProcessError::SpawnFailed { .. })));
    }

    #[test]
    fn test_env_filtering() {
        let runner = ProcessRunner::new(
            Arc::new(SystemTimeProvider),
            vec!["ALLOWED_VAR".to_string()],
        );

        let mut env = HashMap::new();
        env.insert("ALLOWED_VAR".to_string(), "value1".to_string());
        env.insert("BLOCKED_VAR".to_string(), "value2".to_string());

        let filtered = runner.filter_env(&env);

        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("ALLOWED_VAR"));
        assert!(!filtered.contains_key("BLOCKED_VAR"));
    }
}
