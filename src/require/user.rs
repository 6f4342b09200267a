use tracing::info;

use crate::cmd::quote;
use crate::error::DeployResult;
use crate::ssh::Remote;

/// Make sure a system user exists. `shell` is its login shell; no
/// password is set, so the account is only reachable by key.
pub fn user(remote: &dyn Remote, name: &str, shell: &str) -> DeployResult<()> {
    if exists(remote, name)? {
        info!(user = %name, "user already exists");
        return Ok(());
    }

    info!(user = %name, "creating user");
    remote.exec(&format!(
        "useradd --create-home --shell {} {}",
        quote(shell),
        quote(name)
    ))?;
    Ok(())
}

pub fn exists(remote: &dyn Remote, name: &str) -> DeployResult<bool> {
    let output = remote.exec(&format!(
        "getent passwd {} >/dev/null && echo yes || echo no",
        quote(name)
    ))?;
    Ok(output.trim() == "yes")
}

/// Let `name` log in with the keys root accepts, by copying
/// `/root/.ssh/authorized_keys` into its home. Skipped when the
/// user already has an `authorized_keys` file.
pub fn bootstrap_authorized_keys(remote: &dyn Remote, name: &str) -> DeployResult<()> {
    let ssh_dir = format!("/home/{name}/.ssh/");
    let keys = format!("{ssh_dir}authorized_keys");

    if remote.is_file(&keys)? {
        info!(user = %name, "authorized_keys already present");
        return Ok(());
    }

    info!(user = %name, "copying root authorized_keys");
    remote.exec(&format!("mkdir -p {}", quote(&ssh_dir)))?;
    remote.exec(&format!(
        "cp /root/.ssh/authorized_keys {}",
        quote(&ssh_dir)
    ))?;
    remote.exec(&format!(
        "chown {owner}:{owner} {} -R",
        quote(&ssh_dir),
        owner = quote(name)
    ))?;
    Ok(())
}
