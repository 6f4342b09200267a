//! Install and teardown of Piwik on a prepared host.

use tracing::{info, warn};

use crate::cmd::quote;
use crate::config::PiwikConfig;
use crate::error::DeployResult;
use crate::require::{apache, deb, files, mysql, system, user};
use crate::ssh::{Remote, in_dir};
use crate::target::Target;
use crate::vhost::VirtualHost;
use crate::wizard::Wizard;
use crate::wizard::browser::Browser;

pub const LOCALE: &str = "fr_FR.UTF-8";

pub const PACKAGES: &[&str] = &[
    "build-essential",
    "devscripts",
    "locales",
    "apache2",
    "mysql-server",
    "mysql-client",
    "php5",
    "php5-mysql",
    "php5-gd",
    "libapache2-mod-php5",
    "vim",
    "mc",
    "curl",
];

pub const RELEASE_URL: &str = "http://builds.piwik.org/latest.zip";

/// Account Apache runs as.
pub const WEB_USER: &str = "www-data";

/// Directories under the user's home that Piwik writes to, created
/// on its first request.
pub const WRITABLE_DIRS: &[&str] = &[
    "www/tmp",
    "www/tmp/templates_c/",
    "www/tmp/cache/",
    "www/tmp/assets/",
    "www/tmp/tcpdf/",
];

pub const MISSING_CONFIG_WARNING: &str =
    "\"piwik\" configuration missing, run the \"piwik-config\" task first";

/// Result of a task that needs the application configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    /// Nothing was done because no configuration was loaded.
    NotConfigured,
    /// The user declined the confirmation prompt.
    Aborted,
}

/// Return the configuration, or warn that it is missing.
#[must_use]
pub fn require_config(config: Option<&PiwikConfig>) -> Option<&PiwikConfig> {
    if config.is_none() {
        warn!("{MISSING_CONFIG_WARNING}");
    }
    config
}

fn admin(target: &Target) -> mysql::Admin<'_> {
    mysql::Admin {
        user: &target.mysql_user,
        password: &target.mysql_password,
    }
}

/// The virtual host serving `config`.
#[must_use]
pub fn virtual_host(config: &PiwikConfig) -> VirtualHost {
    VirtualHost::new(&config.url, &config.document_root())
}

/// Bring the host to the state Piwik needs: packages, accounts,
/// database, unpacked release and virtual host.
pub fn provision(remote: &dyn Remote, target: &Target, config: &PiwikConfig) -> DeployResult<()> {
    config.validate()?;
    info!(host = %target.host, "provisioning");

    system::locale(remote, LOCALE)?;

    deb::update_index(remote)?;
    deb::preseed_package(
        remote,
        "mysql-server",
        &[
            ("mysql-server/root_password", "password", target.mysql_password.as_str()),
            (
                "mysql-server/root_password_again",
                "password",
                target.mysql_password.as_str(),
            ),
        ],
    )?;
    deb::packages(remote, PACKAGES)?;

    user::user(remote, &config.unix_user, "/bin/bash")?;
    user::bootstrap_authorized_keys(remote, &config.unix_user)?;

    mysql::user(
        remote,
        admin(target),
        &config.database_user,
        &config.database_password,
    )?;
    mysql::database(
        remote,
        admin(target),
        &config.database_name,
        &config.database_user,
    )?;

    unpack_release(remote, config)?;

    apache::remove_default_site(remote)?;
    apache::site(remote, &virtual_host(config), true)?;
    apache::restart(remote)?;

    let document_root = format!("/home/{}/www", config.unix_user);
    info!(%document_root, "handing the tree to {WEB_USER}");
    remote.exec(&format!(
        "chown -R {WEB_USER}:{WEB_USER} {}",
        quote(&document_root)
    ))?;

    Ok(())
}

/// Download the release as the unix user and unpack it to `www/`.
/// Unzip and rename are not guarded: a second run fails here.
pub fn unpack_release(remote: &dyn Remote, config: &PiwikConfig) -> DeployResult<()> {
    let home = config.home();
    let user = &config.unix_user;

    let archive = files::download(remote, user, &home, RELEASE_URL)?;
    info!(%archive, "unpacking release");
    remote.exec_as(user, &in_dir(&home, &format!("unzip -q {}", quote(files::file_name(RELEASE_URL)))))?;
    remote.exec_as(user, &in_dir(&home, "mv piwik www"))?;
    Ok(())
}

/// Page requested once so Piwik creates its `tmp/` tree.
#[must_use]
pub fn warm_up_url(config: &PiwikConfig) -> String {
    config.page_url("index.php")
}

/// Commands opening up the permissions of Piwik's `tmp/` tree.
#[must_use]
pub fn writable_dir_commands(config: &PiwikConfig) -> Vec<String> {
    let home = config.home();
    WRITABLE_DIRS
        .iter()
        .map(|dir| in_dir(&home, &format!("chmod -R 0755 {}", quote(dir))))
        .collect()
}

/// Let Piwik create its `tmp/` tree with a first request, then
/// open up its permissions.
pub fn prepare_writable_dirs(
    remote: &dyn Remote,
    browser: &mut dyn Browser,
    config: &PiwikConfig,
) -> DeployResult<()> {
    config.validate()?;
    browser.open(&warm_up_url(config))?;

    for command in writable_dir_commands(config) {
        remote.exec(&command)?;
    }
    Ok(())
}

/// Full install: provisioning, then the install wizard when a
/// browser is given.
pub fn install(
    remote: &dyn Remote,
    browser: Option<&mut dyn Browser>,
    target: &Target,
    config: &PiwikConfig,
    wizard: Wizard<'_>,
) -> DeployResult<()> {
    provision(remote, target, config)?;

    match browser {
        Some(browser) => {
            prepare_writable_dirs(remote, browser, config)?;
            wizard.run(browser)?;
            info!(url = %config.base_url, "Piwik installed");
        }
        None => info!("no browser, skipping warm-up and install wizard"),
    }
    Ok(())
}

/// Remove the database, the unpacked files and the virtual host.
/// Nothing checks that an install happened first.
pub fn uninstall(remote: &dyn Remote, target: &Target, config: &PiwikConfig) -> DeployResult<()> {
    config.validate()?;
    info!(host = %target.host, "uninstalling");

    mysql::drop_database(remote, admin(target), &config.database_name)?;

    let home = config.home();
    for command in ["rm -f latest.zip", "rm -rf piwik", "rm -rf *.html", "rm -rf www"] {
        remote.exec(&in_dir(&home, command))?;
    }

    apache::disable_site(remote, &config.url)?;
    apache::restart(remote)?;
    Ok(())
}
