use anyhow::{Context, Result};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Command execution context
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Current working directory
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set
    pub env_vars: HashMap<String, String>,
}

/// Builder for CommandExecutor
#[derive(Default)]
pub struct CommandExecutorBuilder {
    context: CommandContext,
}

impl CommandExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working directory
    pub fn working_dir<P: AsRef<Path>>(mut self, dir: Option<P>) -> Self {
        self.context.working_dir = dir.map(|d| d.as_ref().to_path_buf());
        self
    }

    /// Add environment variables
    pub fn env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.context.env_vars.extend(vars);
        self
    }

    /// Add a single environment variable
    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> CommandExecutor {
        CommandExecutor {
            context: self.context,
        }
    }
}

/// Runs external programs synchronously in a fixed directory and environment.
///
/// Output is always captured so that a failing command can report its stderr.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    context: CommandContext,
}

impl CommandExecutor {
    pub fn builder() -> CommandExecutorBuilder {
        CommandExecutorBuilder::new()
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Execute a command with arguments and wait for it to complete, returning the output
    pub fn execute_command_with_args(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let command_str = self.format_command(cmd, args);
        debug!("Executing command: {command_str}");

        let mut command = Command::new(cmd);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.context.working_dir {
            command.current_dir(dir);
        }
        command.envs(&self.context.env_vars);

        let output = command
            .output()
            .with_context(|| format!("Failed to spawn command: {command_str}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Command failed with status {}: {}\nStderr: {}",
                output.status.code().unwrap_or(-1),
                command_str,
                stderr.trim_end()
            );
        }

        Ok(output)
    }

    /// Execute a command and return its trimmed stdout
    pub fn stdout_of(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let output = self.execute_command_with_args(cmd, args)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Format command and arguments for logging
    fn format_command(&self, cmd: &str, args: &[&str]) -> String {
        format!("{} {}", cmd, args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_command_builder() {
        let mut env = HashMap::new();
        env.insert("GIT_TRACE".to_string(), "1".to_string());
        let executor = CommandExecutor::builder()
            .working_dir(Some("/tmp"))
            .env_var("GIT_TERMINAL_PROMPT", "0")
            .env_vars(env)
            .build();

        let context = executor.context();
        assert_eq!(context.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(
            context.env_vars.get("GIT_TERMINAL_PROMPT"),
            Some(&"0".to_string())
        );
        assert_eq!(context.env_vars.get("GIT_TRACE"), Some(&"1".to_string()));
    }

    #[test]
    fn test_runs_in_working_dir_with_env() {
        let dir = tempdir().unwrap();
        let executor = CommandExecutor::builder()
            .working_dir(Some(dir.path()))
            .env_var("FETCHBENCH_TEST_VALUE", "upstream")
            .build();

        let stdout = executor
            .stdout_of("sh", &["-c", "echo $FETCHBENCH_TEST_VALUE; pwd"])
            .unwrap();
        let mut lines = stdout.lines();
        assert_eq!(lines.next(), Some("upstream"));
        let cwd = PathBuf::from(lines.next().unwrap());
        assert_eq!(
            cwd.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_command_failure_handling() {
        let strict = CommandExecutor::builder().build();
        let err = strict
            .execute_command_with_args("sh", &["-c", "echo broken >&2; exit 3"])
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("status 3"));
        assert!(message.contains("broken"));
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let executor = CommandExecutor::builder().build();
        assert!(executor
            .execute_command_with_args("fetchbench-no-such-program", &[])
            .is_err());
    }

    #[test]
    fn test_format_command() {
        let executor = CommandExecutor::builder().build();
        assert_eq!(
            executor.format_command("git", &["clone", "--mirror"]),
            "git clone --mirror"
        );
    }
}
