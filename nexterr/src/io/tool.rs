//! Build/test tool abstraction.
//!
//! The [`BuildTool`] trait decouples the pipeline from the actual toolchain
//! (currently `go`). Tests use scripted tools that return predetermined output
//! without spawning processes.

use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, instrument};

use crate::core::types::Mode;
use crate::io::config::CommandOverrides;
use crate::io::process::run_command_capture;

/// Raw result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    /// Combined stdout and stderr.
    pub output: String,
    pub success: bool,
}

impl ToolRun {
    /// A run that produced no output because no subprocess was started.
    pub fn skipped() -> Self {
        Self {
            output: String::new(),
            success: true,
        }
    }
}

/// Abstraction over diagnostic-producing commands.
pub trait BuildTool {
    /// Run the tool to completion. Errors only when the tool cannot be started.
    fn run(&self) -> Result<ToolRun>;
}

/// Tool that spawns a fixed argv in the current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTool {
    argv: Option<Vec<String>>,
    output_limit_bytes: usize,
}

impl CommandTool {
    pub fn new(argv: Option<Vec<String>>, output_limit_bytes: usize) -> Self {
        Self {
            argv,
            output_limit_bytes,
        }
    }

    pub fn for_mode(
        mode: Mode,
        pattern: Option<&str>,
        overrides: &CommandOverrides,
        output_limit_bytes: usize,
    ) -> Result<Self> {
        let argv = resolve_argv(mode, pattern, overrides)?;
        Ok(Self::new(argv, output_limit_bytes))
    }

    /// `None` when the mode bypasses the subprocess.
    pub fn argv(&self) -> Option<&[String]> {
        self.argv.as_deref()
    }
}

impl BuildTool for CommandTool {
    #[instrument(skip_all)]
    fn run(&self) -> Result<ToolRun> {
        let Some(argv) = &self.argv else {
            debug!("no subprocess for this mode");
            return Ok(ToolRun::skipped());
        };
        let (program, args) = argv
            .split_first()
            .context("tool command must name a program")?;
        info!(command = %argv.join(" "), "running tool");

        let mut cmd = Command::new(program);
        cmd.args(args);
        let output = run_command_capture(cmd, self.output_limit_bytes)
            .with_context(|| format!("run {}", argv.join(" ")))?;

        let success = output.status.success();
        debug!(success, exit_code = ?output.status.code(), "tool finished");
        Ok(ToolRun {
            output: output.combined(),
            success,
        })
    }
}

/// Resolve the argv for `mode`, preferring configured overrides.
///
/// `run-test` requires a pattern; it replaces `{pattern}` in overrides.
pub fn resolve_argv(
    mode: Mode,
    pattern: Option<&str>,
    overrides: &CommandOverrides,
) -> Result<Option<Vec<String>>> {
    let argv: Vec<String> = match mode {
        Mode::Notes => return Ok(None),
        Mode::Build => overrides.build.clone().unwrap_or_else(default_build_argv),
        Mode::Test => overrides
            .test
            .clone()
            .unwrap_or_else(|| to_argv(&["go", "test", "./..."])),
        Mode::RunTest => {
            let Some(pattern) = pattern.filter(|p| !p.trim().is_empty()) else {
                bail!("run-test mode requires --run <PATTERN>");
            };
            match &overrides.run_test {
                Some(argv) => argv
                    .iter()
                    .map(|arg| arg.replace("{pattern}", pattern))
                    .collect(),
                None => to_argv(&["go", "test", "-run", pattern, "./..."]),
            }
        }
        Mode::Analysis => overrides
            .analysis
            .clone()
            .unwrap_or_else(|| to_argv(&["go", "vet", "./..."])),
    };
    Ok(Some(argv))
}

fn default_build_argv() -> Vec<String> {
    let out = std::env::temp_dir().join("nexterr-build");
    vec![
        "go".to_string(),
        "build".to_string(),
        "-o".to_string(),
        out.display().to_string(),
        "./...".to_string(),
    ]
}

fn to_argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_mode_has_no_subprocess() {
        let argv = resolve_argv(Mode::Notes, None, &CommandOverrides::default()).expect("argv");
        assert_eq!(argv, None);
    }

    #[test]
    fn test_mode_defaults_to_go_test() {
        let argv = resolve_argv(Mode::Test, None, &CommandOverrides::default()).expect("argv");
        assert_eq!(argv, Some(to_argv(&["go", "test", "./..."])));
    }

    #[test]
    fn build_mode_writes_binary_to_temp_dir() {
        let argv = resolve_argv(Mode::Build, None, &CommandOverrides::default())
            .expect("argv")
            .expect("subprocess");
        assert_eq!(&argv[..3], &to_argv(&["go", "build", "-o"])[..]);
        assert!(argv[3].ends_with("nexterr-build"));
    }

    #[test]
    fn run_test_requires_pattern() {
        let err = resolve_argv(Mode::RunTest, None, &CommandOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("--run"));
    }

    #[test]
    fn run_test_override_substitutes_pattern() {
        let overrides = CommandOverrides {
            run_test: Some(to_argv(&["gotestsum", "--", "-run", "{pattern}"])),
            ..CommandOverrides::default()
        };
        let argv = resolve_argv(Mode::RunTest, Some("TestParse"), &overrides).expect("argv");
        assert_eq!(argv, Some(to_argv(&["gotestsum", "--", "-run", "TestParse"])));
    }

    #[test]
    fn skipped_tool_reports_success_without_output() {
        let tool = CommandTool::new(None, 1024);
        assert_eq!(tool.run().expect("run"), ToolRun::skipped());
    }

    #[cfg(unix)]
    #[test]
    fn command_tool_reports_failure_and_output() {
        let tool = CommandTool::new(
            Some(to_argv(&["sh", "-c", "echo 'x.go:5:2:syntax error' >&2; exit 2"])),
            1024,
        );
        let run = tool.run().expect("run");
        assert!(!run.success);
        assert_eq!(run.output, "x.go:5:2:syntax error\n");
    }

    #[test]
    fn missing_binary_is_fatal() {
        let tool = CommandTool::new(Some(to_argv(&["nexterr-definitely-missing-binary"])), 1024);
        assert!(tool.run().is_err());
    }
}
