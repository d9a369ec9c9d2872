//! External command execution with a dry-run mode.

use std::process::{Command, Stdio};

use overblur_common::error::{OverblurError, OverblurResult};

/// Characters that force an argument to be quoted when printed.
const SHELL_SPECIAL_CHARS: &str = "`~#$&*()\\|[]{};'\"<>?! ";

/// Runs (or, in dry-run mode, prints) argument vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner {
    dry_run: bool,
}

impl CommandRunner {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Execute `argv`, forwarding the child's stdout and stderr to our stderr.
    ///
    /// In dry-run mode the shell-quoted command line goes to stdout instead
    /// and nothing is executed.
    pub fn run(&self, label: &str, argv: &[String]) -> OverblurResult<()> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| OverblurError::pipeline(format!("{label}: empty command")))?;

        let line = argv_to_string(argv);
        if self.dry_run {
            println!("{line}");
            tracing::debug!(label, command = %line, "Dry run");
            return Ok(());
        }

        tracing::debug!(label, command = %line, "Running");
        let started = std::time::Instant::now();
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| OverblurError::pipeline(format!("{label}: failed to start {program}: {e}")))?;

        if !status.success() {
            return Err(OverblurError::pipeline(format!(
                "{label}: {program} exited with {status}"
            )));
        }
        tracing::debug!(
            label,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Command finished"
        );
        Ok(())
    }
}

/// Join `argv` into a line that can be pasted into a shell.
pub fn argv_to_string(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if arg.chars().any(|c| SHELL_SPECIAL_CHARS.contains(c)) {
                format!("{arg:?}")
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
