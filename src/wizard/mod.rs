//! Scripted run of the Piwik installation wizard.
//!
//! The wizard is a fixed sequence of pages. Each [`Step`] knows
//! its URL, the form it fills (if any) and the fields it sets;
//! [`Wizard::run`] walks them in order and stops at the first
//! error. There is no resume: a failed run has to be torn down
//! and started again.

pub mod browser;
pub mod form;

use tracing::info;

use crate::config::PiwikConfig;
use crate::error::DeployResult;
use crate::wizard::browser::Browser;
use crate::wizard::form::Form;

/// Database host Piwik connects to, from the web server's side.
pub const DATABASE_HOST: &str = "127.0.0.1";
pub const TABLES_PREFIX: &str = "piwik_";
pub const DATABASE_ADAPTER: &str = "PDO_MYSQL";

/// One page of the install wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SystemCheck,
    DatabaseSetup,
    GeneralSetup,
    FirstSiteSetup,
    Finished,
}

impl Step {
    pub const FIRST: Self = Self::SystemCheck;

    /// Page path relative to the Piwik root.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::SystemCheck => "index.php?action=systemCheck",
            Self::DatabaseSetup => "index.php?action=databaseSetup",
            Self::GeneralSetup => "index.php?action=generalSetup&module=Installation",
            Self::FirstSiteSetup => "index.php?action=firstWebsiteSetup&module=Installation",
            Self::Finished => "index.php?action=finished&module=Installation",
        }
    }

    /// Name of the form submitted on this page.
    #[must_use]
    pub const fn form_name(self) -> Option<&'static str> {
        match self {
            Self::SystemCheck | Self::Finished => None,
            Self::DatabaseSetup => Some("databasesetupform"),
            Self::GeneralSetup => Some("generalsetupform"),
            Self::FirstSiteSetup => Some("websitesetupform"),
        }
    }

    /// Fields this step sets; the form must offer all of them.
    #[must_use]
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::SystemCheck | Self::Finished => &[],
            Self::DatabaseSetup => &[
                "host",
                "username",
                "password",
                "dbname",
                "tables_prefix",
                "adapter",
            ],
            Self::GeneralSetup => &[
                "login",
                "password",
                "password_bis",
                "email",
                "subscribe_newsletter_security",
                "subscribe_newsletter_community",
            ],
            Self::FirstSiteSetup => &["siteName", "url", "timezone", "ecommerce"],
        }
    }

    #[must_use]
    pub const fn next_step(self) -> Option<Self> {
        match self {
            Self::SystemCheck => Some(Self::DatabaseSetup),
            Self::DatabaseSetup => Some(Self::GeneralSetup),
            Self::GeneralSetup => Some(Self::FirstSiteSetup),
            Self::FirstSiteSetup => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Every step, in wizard order.
    pub fn sequence() -> impl Iterator<Item = Self> {
        std::iter::successors(Some(Self::FIRST), |s| s.next_step())
    }
}

/// Value given to a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text input, or the option to pick in a select.
    Text(String),
    /// Checkbox state.
    Checked(bool),
}

impl FieldValue {
    fn apply(&self, form: &mut Form, field: &str) -> DeployResult<()> {
        match self {
            Self::Text(value) => form.set(field, value),
            Self::Checked(checked) => form.set_checked(field, *checked),
        }
    }
}

/// Value of the first site's `ecommerce` select.
///
/// Reproduces the historical runbook: the flag is `1` whenever the
/// site *name* is non-empty, so `first_site_ecommerce` is ignored.
/// With `corrected` set, `first_site_ecommerce` is used instead.
#[must_use]
pub fn ecommerce_flag(config: &PiwikConfig, corrected: bool) -> &'static str {
    let enabled = if corrected {
        config.first_site_ecommerce
    } else {
        !config.first_site_name.is_empty()
    };
    if enabled { "1" } else { "0" }
}

/// Drives the install wizard for one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Wizard<'a> {
    config: &'a PiwikConfig,
    correct_ecommerce_flag: bool,
}

impl<'a> Wizard<'a> {
    #[must_use]
    pub const fn new(config: &'a PiwikConfig) -> Self {
        Self {
            config,
            correct_ecommerce_flag: false,
        }
    }

    /// Derive the e-commerce flag from `first_site_ecommerce`
    /// rather than from the site name.
    #[must_use]
    pub const fn correct_ecommerce_flag(mut self) -> Self {
        self.correct_ecommerce_flag = true;
        self
    }

    /// Field values submitted on `step`, in submission order.
    #[must_use]
    pub fn fields(&self, step: Step) -> Vec<(&'static str, FieldValue)> {
        let c = self.config;
        let text = |v: &str| FieldValue::Text(v.to_string());

        match step {
            Step::SystemCheck | Step::Finished => Vec::new(),
            Step::DatabaseSetup => vec![
                ("host", text(DATABASE_HOST)),
                ("username", text(&c.database_user)),
                ("password", text(&c.database_password)),
                ("dbname", text(&c.database_name)),
                ("tables_prefix", text(TABLES_PREFIX)),
                ("adapter", text(DATABASE_ADAPTER)),
            ],
            Step::GeneralSetup => vec![
                ("login", text(&c.admin_user)),
                ("password", text(&c.admin_password)),
                ("password_bis", text(&c.admin_password)),
                ("email", text(&c.admin_email)),
                ("subscribe_newsletter_security", FieldValue::Checked(false)),
                ("subscribe_newsletter_community", FieldValue::Checked(false)),
            ],
            Step::FirstSiteSetup => vec![
                ("siteName", text(&c.first_site_name)),
                ("url", text(&c.first_site_url)),
                ("timezone", text(&c.first_site_timezone)),
                (
                    "ecommerce",
                    text(ecommerce_flag(c, self.correct_ecommerce_flag)),
                ),
            ],
        }
    }

    /// Walk every step against `browser`.
    pub fn run(&self, browser: &mut dyn Browser) -> DeployResult<()> {
        for step in Step::sequence() {
            self.run_step(browser, step)?;
        }
        info!("install wizard finished");
        Ok(())
    }

    /// Open the page of `step` and, if it has a form, fill and
    /// submit it.
    pub fn run_step(&self, browser: &mut dyn Browser, step: Step) -> DeployResult<()> {
        let url = self.config.page_url(step.path());
        info!(?step, %url, "wizard step");
        let page = browser.open(&url)?;

        let Some(form_name) = step.form_name() else {
            return Ok(());
        };

        let mut form = page.form(form_name)?;
        for (field, value) in self.fields(step) {
            value.apply(&mut form, field)?;
        }
        let submission = form.submission(&page.url)?;
        browser.send(&submission)?;
        Ok(())
    }
}
