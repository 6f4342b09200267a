//! Provision a LAMP host and install Piwik on it.
//!
//! `piwik-deploy` resolves a Vagrant machine (or any SSH host),
//! installs Apache, MySQL and PHP, unpacks the latest Piwik
//! release, publishes it through an Apache virtual host, and then
//! fills in Piwik's web installer so the instance is ready to use.
//!
//! # Overview
//!
//! An invocation is a chain of tasks run against one [`Runbook`]:
//!
//! - a [`Target`] describing the host (`vagrant`, `host:...`)
//! - a [`PiwikConfig`] loaded from the environment
//!   (`piwik-config`)
//! - `install` or `uninstall`
//!
//! # Architecture
//!
//! The install runs in three phases:
//!
//! 1. **Provision** - locale, packages, system user, MySQL user and
//!    database, release archive, virtual host
//!    ([`install::provision`], built from the [`require`]
//!    primitives)
//! 2. **Warm up** - first request to Piwik, then permissions on its
//!    `tmp/` tree
//! 3. **Wizard** - the five pages of the installer, driven by
//!    [`Wizard`] through a [`Browser`](wizard::browser::Browser)
//!
//! Remote commands go through the [`Remote`](ssh::Remote) trait,
//! implemented over `ssh` by [`SshSession`] and by
//! [`DryRun`](ssh::DryRun) for `--dry-run`.
//!
//! # Examples
//!
//! ```sh
//! # Deploy to the default Vagrant machine
//! piwik-deploy vagrant piwik-config install
//!
//! # Preview every remote command
//! piwik-deploy vagrant piwik-config install --dry-run
//!
//! # Deploy to a named host
//! MYSQL_PASSWORD=s3cret piwik-deploy host:root@203.0.113.7 piwik-config install
//!
//! # Tear down
//! piwik-deploy vagrant piwik-config uninstall
//! ```
//!
//! The same flow from Rust:
//!
//! ```rust,no_run
//! use piwik_deploy::{PiwikConfig, Runbook, Target};
//!
//! fn main() -> anyhow::Result<()> {
//!     let runbook = Runbook::new()
//!         .with_target(Target::vagrant("")?)
//!         .with_config(PiwikConfig::from_env()?);
//!
//!     runbook.install()?;
//!     Ok(())
//! }
//! ```

// Allow noisy pedantic lints that don't add value for a
// deployment tool crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cmd;
pub mod config;
pub mod error;
pub mod install;
pub mod pipeline;
pub mod require;
pub mod ssh;
pub mod target;
pub mod vhost;
pub mod wizard;

pub use config::PiwikConfig;
pub use install::TaskOutcome;
pub use pipeline::{Runbook, Task};
pub use ssh::SshSession;
pub use target::Target;
pub use vhost::VirtualHost;
pub use wizard::{Step, Wizard};
