use std::cell::RefCell;
use std::fmt;

use tracing::{debug, info};

use crate::cmd::{self, quote};
use crate::error::DeployResult;

/// Command execution on the deployment host.
///
/// Implemented over `ssh` by [`SshSession`] and by [`DryRun`],
/// which only prints what would be executed.
pub trait Remote {
    /// Execute a command as the connection user and capture its
    /// output.
    fn exec(&self, command: &str) -> DeployResult<String>;

    /// Execute a command with output streamed to the terminal.
    fn exec_interactive(&self, command: &str) -> DeployResult<()>;

    /// Execute a command logged in as another user of the same
    /// host.
    fn exec_as(&self, user: &str, command: &str) -> DeployResult<String>;

    /// Like [`exec`](Remote::exec) for a command holding secrets.
    /// Only [`Sensitive::shown`] is ever printed or logged.
    fn exec_sensitive(&self, command: &Sensitive) -> DeployResult<String>;

    /// Write `content` to a file on the host.
    fn write_file(&self, content: &str, path: &str) -> DeployResult<()>;

    /// Whether `path` exists and is a regular file.
    fn is_file(&self, path: &str) -> DeployResult<bool> {
        let output = self.exec(&format!(
            "test -f {} && echo yes || echo no",
            quote(path)
        ))?;
        Ok(output.trim() == "yes")
    }
}

/// Printed in place of a secret.
pub const MASK: &str = "********";

/// A command line holding secrets, together with the form of it
/// that may be printed or logged.
///
/// ```
/// use piwik_deploy::ssh::Sensitive;
///
/// let cmd = Sensitive::render(&["s3cret"], |s| format!("login --password={}", s[0]));
///
/// assert_eq!(cmd.command(), "login --password=s3cret");
/// assert_eq!(cmd.shown(), "login --password=********");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Sensitive {
    command: String,
    shown: String,
}

impl Sensitive {
    /// Render the command once from `secrets` and once with every
    /// secret replaced by [`MASK`].
    #[must_use]
    pub fn render(secrets: &[&str], render: impl Fn(&[&str]) -> String) -> Self {
        let masked = vec![MASK; secrets.len()];
        Self {
            command: render(secrets),
            shown: render(masked.as_slice()),
        }
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn shown(&self) -> &str {
        &self.shown
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sensitive").field(&self.shown).finish()
    }
}

/// Prefix `command` with a change of working directory.
#[must_use]
pub fn in_dir(dir: &str, command: &str) -> String {
    format!("cd {} && {command}", quote(dir))
}

/// SSH session wrapper for executing commands and writing files
/// on a remote host.
#[derive(Debug, Clone)]
pub struct SshSession {
    host: String,
    user: String,
    port: u16,
    key: Option<String>,
    disable_known_hosts: bool,
}

impl SshSession {
    #[must_use]
    pub fn new(host: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            port: 22,
            key: None,
            disable_known_hosts: false,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key_path: &str) -> Self {
        self.key = Some(key_path.to_string());
        self
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Skip host key verification entirely, as Vagrant machines
    /// get a new key on every rebuild.
    #[must_use]
    pub const fn disable_known_hosts(mut self) -> Self {
        self.disable_known_hosts = true;
        self
    }

    /// Same connection, different login.
    #[must_use]
    pub fn as_user(&self, user: &str) -> Self {
        Self {
            user: user.to_string(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.ssh_base_args();
        args.push(self.destination());
        args.push(command.to_string());
        args
    }

    fn ssh_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            self.port.to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
        ];
        if self.disable_known_hosts {
            args.extend([
                "-o".to_string(),
                "StrictHostKeyChecking=no".to_string(),
                "-o".to_string(),
                "UserKnownHostsFile=/dev/null".to_string(),
                "-o".to_string(),
                "LogLevel=ERROR".to_string(),
            ]);
        } else {
            args.extend([
                "-o".to_string(),
                "StrictHostKeyChecking=accept-new".to_string(),
            ]);
        }
        if let Some(key) = &self.key {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args
    }
}

impl Remote for SshSession {
    fn exec(&self, command: &str) -> DeployResult<String> {
        debug!(destination = %self.destination(), %command, "ssh exec");
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run("ssh", &refs)
    }

    fn exec_interactive(&self, command: &str) -> DeployResult<()> {
        debug!(destination = %self.destination(), %command, "ssh exec (interactive)");
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_interactive("ssh", &refs)
    }

    fn exec_as(&self, user: &str, command: &str) -> DeployResult<String> {
        self.as_user(user).exec(command)
    }

    fn exec_sensitive(&self, command: &Sensitive) -> DeployResult<String> {
        debug!(destination = %self.destination(), command = %command.shown(), "ssh exec");
        let args = self.build_ssh_args(command.command());
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let shown = format!("ssh {}", self.build_ssh_args(command.shown()).join(" "));
        cmd::run_masked("ssh", &refs, &shown)
    }

    fn write_file(&self, content: &str, path: &str) -> DeployResult<()> {
        debug!(destination = %self.destination(), %path, "writing remote file");
        let command = format!("cat > {}", quote(path));
        let args = self.build_ssh_args(&command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_with_stdin("ssh", &refs, content.as_bytes())?;
        Ok(())
    }
}

/// Prints every remote action instead of performing it.
///
/// Commands return empty output and files are reported missing,
/// so guarded steps show their "create" branch. Printed lines are
/// also kept, see [`DryRun::transcript`].
#[derive(Debug, Clone)]
pub struct DryRun {
    destination: String,
    lines: RefCell<Vec<String>>,
}

impl DryRun {
    #[must_use]
    pub fn new(destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            lines: RefCell::new(Vec::new()),
        }
    }

    /// Everything printed so far.
    #[must_use]
    pub fn transcript(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    fn print(&self, line: String) {
        println!("{line}");
        self.lines.borrow_mut().push(line);
    }
}

impl Remote for DryRun {
    fn exec(&self, command: &str) -> DeployResult<String> {
        self.print(format!("[{}] {command}", self.destination));
        Ok(String::new())
    }

    fn exec_interactive(&self, command: &str) -> DeployResult<()> {
        self.print(format!("[{}] {command}", self.destination));
        Ok(())
    }

    fn exec_as(&self, user: &str, command: &str) -> DeployResult<String> {
        self.print(format!("[{user}] {command}"));
        Ok(String::new())
    }

    fn exec_sensitive(&self, command: &Sensitive) -> DeployResult<String> {
        self.exec(command.shown())
    }

    fn write_file(&self, content: &str, path: &str) -> DeployResult<()> {
        info!(%path, "would write file");
        self.print(format!("--- {path} ---"));
        self.print(content.to_string());
        Ok(())
    }

    fn is_file(&self, _path: &str) -> DeployResult<bool> {
        Ok(false)
    }
}
