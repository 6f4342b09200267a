use std::fmt::Write;

use crate::error::{DeployError, DeployResult};

/// Port every rendered virtual host listens on.
pub const LISTEN_PORT: u16 = 80;

/// Override policy written when none is given.
pub const DEFAULT_ALLOW_OVERRIDE: &str = "All";

/// An Apache site definition binding a hostname to a document
/// root.
///
/// # Example
///
/// ```
/// use piwik_deploy::VirtualHost;
///
/// let site = VirtualHost::new("stats.example.com", "/home/piwik/www/")
///     .alias("www.stats.example.com");
///
/// let conf = piwik_deploy::vhost::render(&site);
///
/// assert!(conf.contains("ServerName stats.example.com"));
/// assert!(conf.contains("ServerAlias www.stats.example.com"));
/// assert!(conf.contains("AllowOverride All"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualHost {
    /// Site name under `sites-available/`.
    pub name: String,
    pub hostname: String,
    pub aliases: Vec<String>,
    pub document_root: String,
    pub allow_override: Option<String>,
}

impl VirtualHost {
    /// A site named after its hostname.
    #[must_use]
    pub fn new(hostname: &str, document_root: &str) -> Self {
        Self {
            name: hostname.to_string(),
            hostname: hostname.to_string(),
            aliases: Vec::new(),
            document_root: document_root.to_string(),
            allow_override: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    #[must_use]
    pub fn allow_override(mut self, policy: &str) -> Self {
        self.allow_override = Some(policy.to_string());
        self
    }

    /// Fail on a blank name, hostname or document root.
    pub fn validate(&self) -> DeployResult<()> {
        for (param, value) in [
            ("name", &self.name),
            ("hostname", &self.hostname),
            ("document_root", &self.document_root),
        ] {
            if value.trim().is_empty() {
                return Err(DeployError::MissingParameter(format!("virtual host {param}")));
            }
        }
        Ok(())
    }
}

/// Render the Apache configuration for `site`.
#[must_use]
pub fn render(site: &VirtualHost) -> String {
    let mut out = String::new();
    let override_policy = site
        .allow_override
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_ALLOW_OVERRIDE);

    // Writing to a String cannot fail.
    let _ = writeln!(out, "<VirtualHost *:{LISTEN_PORT}>");
    let _ = writeln!(out, "    ServerName {}", site.hostname);
    for alias in &site.aliases {
        let _ = writeln!(out, "    ServerAlias {alias}");
    }
    out.push('\n');
    let _ = writeln!(out, "    DocumentRoot {}", site.document_root);
    out.push('\n');
    let _ = writeln!(out, "    <Directory {}>", site.document_root);
    out.push_str("        Options Indexes FollowSymLinks MultiViews\n\n");
    let _ = writeln!(out, "        AllowOverride {override_policy}");
    out.push('\n');
    out.push_str("        Order allow,deny\n");
    out.push_str("        allow from all\n");
    out.push_str("    </Directory>\n");
    out.push_str("</VirtualHost>\n");

    out
}
