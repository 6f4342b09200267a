use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::cmd;
use crate::config;
use crate::error::{DeployError, DeployResult};
use crate::ssh::SshSession;

/// Default MySQL administrator password when `MYSQL_PASSWORD` is
/// unset.
pub const DEFAULT_MYSQL_PASSWORD: &str = "password";

/// Connection parameters of the host being deployed to, plus
/// the database administrator credentials used on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub identity_file: Option<String>,
    pub disable_known_hosts: bool,
    pub mysql_user: String,
    #[serde(skip)]
    pub mysql_password: String,
}

impl Target {
    /// Resolve a Vagrant machine through `vagrant ssh-config`.
    ///
    /// An empty `name` targets the default machine. The SSH
    /// user is always switched to `root`.
    pub fn vagrant(name: &str) -> DeployResult<Self> {
        if !cmd::command_exists("vagrant") {
            return Err(DeployError::CommandNotFound("vagrant".into()));
        }
        info!(machine = %display_machine(name), "resolving vagrant ssh-config");

        let mut args = vec!["ssh-config"];
        if !name.is_empty() {
            args.push(name);
        }
        let output = cmd::run("vagrant", &args)?;

        Self::from_ssh_config(&output, &config::process_env)
    }

    /// Build a target from `ssh-config` style output.
    ///
    /// `lookup` resolves environment variables, which keeps the
    /// process environment out of tests.
    pub fn from_ssh_config<E>(
        output: &str,
        lookup: &impl Fn(&str) -> Result<String, E>,
    ) -> DeployResult<Self> {
        let settings = parse_ssh_config(output);

        let host = settings
            .get("hostname")
            .cloned()
            .ok_or_else(|| DeployError::InvalidTarget("ssh-config has no HostName".into()))?;
        let port = match settings.get("port") {
            Some(p) => parse_port(p)?,
            None => 22,
        };
        let disable_known_hosts = settings
            .get("userknownhostsfile")
            .is_some_and(|f| f == "/dev/null")
            || settings
                .get("stricthostkeychecking")
                .is_some_and(|v| v.eq_ignore_ascii_case("no"));

        Ok(Self {
            host,
            port,
            user: "root".to_string(),
            identity_file: settings.get("identityfile").cloned(),
            disable_known_hosts,
            mysql_user: "root".to_string(),
            mysql_password: mysql_password(lookup),
        })
    }

    /// Target a named host given as `[user@]host[:port]`.
    pub fn remote(destination: &str) -> DeployResult<Self> {
        Self::remote_with(destination, &config::process_env)
    }

    pub fn remote_with<E>(
        destination: &str,
        lookup: &impl Fn(&str) -> Result<String, E>,
    ) -> DeployResult<Self> {
        let (user, rest) = match destination.split_once('@') {
            Some((u, r)) => (u, r),
            None => ("root", destination),
        };
        let (host, port) = match rest.rsplit_once(':') {
            Some((h, p)) => (h, parse_port(p)?),
            None => (rest, 22),
        };

        if user.is_empty() || host.is_empty() {
            return Err(DeployError::InvalidTarget(destination.to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            user: user.to_string(),
            identity_file: None,
            disable_known_hosts: false,
            mysql_user: "root".to_string(),
            mysql_password: mysql_password(lookup),
        })
    }

    /// Open an SSH session as the target's user.
    #[must_use]
    pub fn session(&self) -> SshSession {
        let ssh = SshSession::new(&self.host, &self.user).port(self.port);
        let ssh = match &self.identity_file {
            Some(key) => ssh.with_key(key),
            None => ssh,
        };
        if self.disable_known_hosts {
            ssh.disable_known_hosts()
        } else {
            ssh
        }
    }
}

/// Parse `ssh -G` / `vagrant ssh-config` output into a map of
/// lowercase keys. The first value of a repeated key wins, as in
/// OpenSSH.
#[must_use]
pub fn parse_ssh_config(output: &str) -> HashMap<String, String> {
    let mut settings = HashMap::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(char::is_whitespace) else {
            continue;
        };
        let key = key.to_ascii_lowercase();
        if key == "host" {
            continue;
        }
        let value = unquote(value.trim());
        settings.entry(key).or_insert_with(|| value.to_string());
    }

    settings
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_port(raw: &str) -> DeployResult<u16> {
    raw.parse()
        .map_err(|_| DeployError::InvalidTarget(format!("invalid port '{raw}'")))
}

fn mysql_password<E>(lookup: &impl Fn(&str) -> Result<String, E>) -> String {
    lookup("MYSQL_PASSWORD").unwrap_or_else(|_| DEFAULT_MYSQL_PASSWORD.to_string())
}

const fn display_machine(name: &str) -> &str {
    if name.is_empty() { "default" } else { name }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Result<String, ()> {
        Err(())
    }

    #[test]
    fn unquote_identity_file() {
        assert_eq!(unquote("\"/a b/key\""), "/a b/key");
        assert_eq!(unquote("/plain/key"), "/plain/key");
        assert_eq!(unquote("\"unterminated"), "\"unterminated");
    }

    #[test]
    fn remote_defaults_user_and_port() {
        let target = Target::remote_with("example.org", &no_env).unwrap();

        assert_eq!(target.user, "root");
        assert_eq!(target.host, "example.org");
        assert_eq!(target.port, 22);
        assert_eq!(target.mysql_password, DEFAULT_MYSQL_PASSWORD);
    }

    #[test]
    fn remote_rejects_empty_host() {
        assert!(Target::remote_with("admin@", &no_env).is_err());
        assert!(Target::remote_with("admin@:22", &no_env).is_err());
    }

    #[test]
    fn display_default_machine() {
        assert_eq!(display_machine(""), "default");
        assert_eq!(display_machine("web"), "web");
    }
}
