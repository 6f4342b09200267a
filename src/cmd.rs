use std::io::Write;
use std::process::{Command, Output, Stdio};

use tracing::{debug, error};

use crate::error::{DeployError, DeployResult};

/// Run a local command and capture its stdout. Fails if the
/// command returns a non-zero exit code.
pub fn run(program: &str, args: &[&str]) -> DeployResult<String> {
    run_masked(program, args, &format_command(program, args))
}

/// Like [`run`], but logs and reports `shown` instead of the real
/// command line, which holds secrets.
pub fn run_masked(program: &str, args: &[&str], shown: &str) -> DeployResult<String> {
    debug!(command = %shown, "running");
    let output = spawn(program, args)?;
    into_stdout(shown, &output)
}

/// Run a command with stdin/stdout/stderr inherited, so long
/// operations (apt, unzip) stream their progress.
pub fn run_interactive(program: &str, args: &[&str]) -> DeployResult<()> {
    debug!(command = %format_command(program, args), "running interactively");
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| not_found_or_io(program, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(DeployError::CommandFailed {
            command: format_command(program, args),
            status,
        })
    }
}

/// Run a command that reads its stdin from a byte slice.
pub fn run_with_stdin(program: &str, args: &[&str], stdin_data: &[u8]) -> DeployResult<String> {
    debug!(
        command = %format_command(program, args),
        bytes = stdin_data.len(),
        "running with stdin"
    );
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| not_found_or_io(program, e))?;

    if let Some(stdin) = &mut child.stdin {
        stdin.write_all(stdin_data)?;
    }
    drop(child.stdin.take());

    let output = child.wait_with_output()?;
    into_stdout(&format_command(program, args), &output)
}

/// Check if a command exists on PATH.
#[must_use]
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Quote a string for a POSIX shell. Safe words are returned
/// unchanged, anything else is wrapped in single quotes.
///
/// ```
/// use piwik_deploy::cmd::quote;
///
/// assert_eq!(quote("piwik"), "piwik");
/// assert_eq!(quote("it's"), r"'it'\''s'");
/// ```
#[must_use]
pub fn quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@,+%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

fn spawn(program: &str, args: &[&str]) -> DeployResult<Output> {
    Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| not_found_or_io(program, e))
}

fn into_stdout(command: &str, output: &Output) -> DeployResult<String> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!(%stderr, "command exited with {}", output.status);
        Err(DeployError::CommandFailed {
            command: command.to_string(),
            status: output.status,
        })
    }
}

fn not_found_or_io(program: &str, e: std::io::Error) -> DeployError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DeployError::CommandNotFound(program.to_string())
    } else {
        DeployError::Io(e)
    }
}

fn format_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_leaves_plain_words() {
        assert_eq!(quote("latest.zip"), "latest.zip");
        assert_eq!(quote("www-data:www-data"), "www-data:www-data");
        assert_eq!(quote("/home/piwik/www/"), "/home/piwik/www/");
    }

    #[test]
    fn quote_wraps_spaces_and_metacharacters() {
        assert_eq!(quote("two words"), "'two words'");
        assert_eq!(quote("a;rm -rf /"), "'a;rm -rf /'");
        assert_eq!(quote("$HOME"), "'$HOME'");
    }

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(quote("pa'ss"), r"'pa'\''ss'");
    }

    #[test]
    fn quote_empty_string() {
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn format_joins_args() {
        assert_eq!(
            format_command("vagrant", &["ssh-config", "web"]),
            "vagrant ssh-config web"
        );
    }
}
