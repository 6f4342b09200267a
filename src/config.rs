use std::path::Path;

use serde::Serialize;

use crate::error::{DeployError, DeployResult};

/// Fallback for every secret that is not provided through the
/// environment.
pub const DEFAULT_PASSWORD: &str = "password";

/// Read a variable from the process environment.
///
/// A plain function (rather than `std::env::var` itself) so it can
/// be passed where a `Fn(&str)` lookup is expected.
pub fn process_env(key: &str) -> Result<String, std::env::VarError> {
    std::env::var(key)
}

/// Load variables from an env file into the process environment.
///
/// Returns `false` when the file does not exist. A file that cannot
/// be parsed is an error. Variables already set are kept.
pub fn load_env_file(path: &Path) -> DeployResult<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Everything needed to install one Piwik instance.
///
/// Built with [`PiwikConfig::from_env`] or assembled field by field
/// and checked with [`PiwikConfig::validate`].
///
/// # Example
///
/// ```
/// use piwik_deploy::PiwikConfig;
///
/// let config = PiwikConfig::defaults();
///
/// assert_eq!(config.unix_user, "piwik");
/// assert_eq!(config.document_root(), "/home/piwik/www/");
/// assert_eq!(config.base_url, "http://piwik.stephane-klein.info");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PiwikConfig {
    pub unix_user: String,
    /// Public hostname, also the virtual-host name.
    pub url: String,

    pub database_name: String,
    pub database_user: String,
    #[serde(serialize_with = "mask")]
    pub database_password: String,

    pub admin_user: String,
    #[serde(serialize_with = "mask")]
    pub admin_password: String,
    pub admin_email: String,

    pub first_site_name: String,
    pub first_site_url: String,
    pub first_site_timezone: String,
    pub first_site_ecommerce: bool,

    /// Where the install wizard is reached, without trailing slash.
    pub base_url: String,
}

impl PiwikConfig {
    /// Literal defaults, no environment involved.
    #[must_use]
    pub fn defaults() -> Self {
        let url = "piwik.stephane-klein.info".to_string();
        Self {
            unix_user: "piwik".to_string(),
            base_url: format!("http://{url}"),
            url,
            database_name: "piwik".to_string(),
            database_user: "piwik".to_string(),
            database_password: DEFAULT_PASSWORD.to_string(),
            admin_user: "admin".to_string(),
            admin_password: DEFAULT_PASSWORD.to_string(),
            admin_email: "contact@stephane-klein.info".to_string(),
            first_site_name: "stephane-klein.info".to_string(),
            first_site_url: "http://stephane-klein.info".to_string(),
            first_site_timezone: "Europe/Paris".to_string(),
            first_site_ecommerce: false,
        }
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> DeployResult<Self> {
        Self::from_lookup(&process_env)
    }

    /// Defaults overridden through `lookup`:
    ///
    /// - `PIWIK_MYSQL_PASSWORD` for the application database
    /// - `PIWIK_ADMIN_PASSWORD` for the Piwik superuser
    /// - `PIWIK_BASE_URL` for the wizard entry point
    pub fn from_lookup<E>(lookup: &impl Fn(&str) -> Result<String, E>) -> DeployResult<Self> {
        let mut config = Self::defaults();

        if let Ok(password) = lookup("PIWIK_MYSQL_PASSWORD") {
            config.database_password = password;
        }
        if let Ok(password) = lookup("PIWIK_ADMIN_PASSWORD") {
            config.admin_password = password;
        }
        if let Ok(base_url) = lookup("PIWIK_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject empty required fields.
    pub fn validate(&self) -> DeployResult<()> {
        let required = [
            ("unix_user", &self.unix_user),
            ("url", &self.url),
            ("database_name", &self.database_name),
            ("database_user", &self.database_user),
            ("database_password", &self.database_password),
            ("admin_user", &self.admin_user),
            ("admin_password", &self.admin_password),
            ("admin_email", &self.admin_email),
            ("first_site_name", &self.first_site_name),
            ("first_site_url", &self.first_site_url),
            ("first_site_timezone", &self.first_site_timezone),
            ("base_url", &self.base_url),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(DeployError::MissingParameter(name.to_string()));
            }
        }
        Ok(())
    }

    /// Home directory of the unix user, with trailing slash.
    #[must_use]
    pub fn home(&self) -> String {
        format!("/home/{}/", self.unix_user)
    }

    /// Directory Apache serves Piwik from.
    #[must_use]
    pub fn document_root(&self) -> String {
        format!("/home/{}/www/", self.unix_user)
    }

    /// Absolute URL of a wizard page, `path` starting after the
    /// host (e.g. `index.php?action=systemCheck`).
    #[must_use]
    pub fn page_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

fn mask<S: serde::Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("********")
    }
}
