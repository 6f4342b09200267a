use tracing::info;

use crate::cmd::quote;
use crate::error::DeployResult;
use crate::ssh::{Remote, Sensitive};

const APT_ENV: &str = "DEBIAN_FRONTEND=noninteractive";

/// Refresh the package index.
pub fn update_index(remote: &dyn Remote) -> DeployResult<()> {
    info!("updating package index");
    remote.exec_interactive(&format!("{APT_ENV} apt-get --quiet --quiet update"))
}

/// A debconf answer: `(question, type, value)`.
pub type Preseed<'a> = (&'a str, &'a str, &'a str);

/// Answer installation prompts of `package` ahead of time.
/// Values of `password` questions are masked in the output.
pub fn preseed_package(remote: &dyn Remote, package: &str, answers: &[Preseed<'_>]) -> DeployResult<()> {
    info!(%package, count = answers.len(), "preseeding debconf answers");
    for &(question, kind, value) in answers {
        let secrets = if kind == "password" { vec![value] } else { Vec::new() };
        let command = Sensitive::render(&secrets, |s| {
            let value = s.first().copied().unwrap_or(value);
            format!(
                "echo {} | debconf-set-selections",
                quote(&selection(package, (question, kind, value)))
            )
        });
        remote.exec_sensitive(&command)?;
    }
    Ok(())
}

/// `debconf-set-selections` line for one answer.
#[must_use]
pub fn selection(package: &str, (question, kind, value): Preseed<'_>) -> String {
    format!("{package} {question} {kind} {value}")
}

/// Whether `package` is installed.
pub fn is_installed(remote: &dyn Remote, package: &str) -> DeployResult<bool> {
    let status = remote.exec(&format!(
        "dpkg-query --show --showformat='${{Status}}' {} 2>/dev/null || true",
        quote(package)
    ))?;
    Ok(status.trim() == "install ok installed")
}

/// Install the packages of `packages` that are missing.
pub fn packages(remote: &dyn Remote, packages: &[&str]) -> DeployResult<()> {
    let mut missing = Vec::new();
    for package in packages {
        if !is_installed(remote, package)? {
            missing.push(quote(package));
        }
    }

    if missing.is_empty() {
        info!("all {} packages already installed", packages.len());
        return Ok(());
    }

    info!(packages = %missing.join(" "), "installing packages");
    remote.exec_interactive(&format!(
        "{APT_ENV} apt-get install --quiet --assume-yes {}",
        missing.join(" ")
    ))
}
