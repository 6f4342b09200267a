use tracing::info;

use crate::cmd::quote;
use crate::error::DeployResult;
use crate::ssh::Remote;
use crate::vhost::{self, VirtualHost};

pub const SITES_AVAILABLE: &str = "/etc/apache2/sites-available";
pub const SITES_ENABLED: &str = "/etc/apache2/sites-enabled";

/// Path of the configuration file for site `name`.
#[must_use]
pub fn site_config_path(name: &str) -> String {
    format!("{SITES_AVAILABLE}/{name}.conf")
}

/// Remove the stock site so it does not shadow ours.
pub fn remove_default_site(remote: &dyn Remote) -> DeployResult<()> {
    info!("removing default site");
    remote.exec(&format!("rm {SITES_ENABLED}/000-default -rf"))?;
    Ok(())
}

pub fn is_site_enabled(remote: &dyn Remote, name: &str) -> DeployResult<bool> {
    let output = remote.exec(&format!(
        "test -e {} && echo yes || echo no",
        quote(&format!("{SITES_ENABLED}/{name}.conf"))
    ))?;
    Ok(output.trim() == "yes")
}

/// Write the site configuration and, when `enable` is set, enable
/// it. Apache is not restarted.
pub fn site(remote: &dyn Remote, site: &VirtualHost, enable: bool) -> DeployResult<()> {
    site.validate()?;

    let path = site_config_path(&site.name);
    info!(site = %site.name, %path, "writing virtual host");
    remote.write_file(&vhost::render(site), &path)?;

    if enable && !is_site_enabled(remote, &site.name)? {
        info!(site = %site.name, "enabling site");
        remote.exec(&format!("a2ensite {}", quote(&site.name)))?;
    }
    Ok(())
}

pub fn disable_site(remote: &dyn Remote, name: &str) -> DeployResult<()> {
    info!(site = %name, "disabling site");
    remote.exec(&format!("a2dissite {}", quote(name)))?;
    Ok(())
}

pub fn restart(remote: &dyn Remote) -> DeployResult<()> {
    info!("restarting apache");
    remote.exec("service apache2 restart")?;
    Ok(())
}
