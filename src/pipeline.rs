use std::fmt;
use std::str::FromStr;

use clap::Parser;
use tracing::{debug, info};

use crate::cmd;
use crate::config::PiwikConfig;
use crate::error::{DeployError, DeployResult};
use crate::install::{self, TaskOutcome};
use crate::ssh::{DryRun, Remote};
use crate::target::Target;
use crate::wizard::{Step, Wizard};
use crate::wizard::browser::{Browser, HttpBrowser};

/// One step of a command line such as
/// `piwik-deploy vagrant piwik-config install`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Resolve a Vagrant machine; empty name for the default one.
    Vagrant(String),
    /// Use a named host, `[user@]host[:port]`.
    Host(String),
    /// Load the Piwik configuration from the environment.
    PiwikConfig,
    Install,
    Uninstall,
}

impl FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vagrant" => return Ok(Self::Vagrant(String::new())),
            "piwik-config" | "piwik_config" => return Ok(Self::PiwikConfig),
            "install" | "install_piwik" => return Ok(Self::Install),
            "uninstall" | "uninstall_piwik" => return Ok(Self::Uninstall),
            _ => {}
        }

        match s.split_once(':') {
            Some(("vagrant", name)) => Ok(Self::Vagrant(name.to_string())),
            Some(("host", dest)) if !dest.is_empty() => Ok(Self::Host(dest.to_string())),
            _ => Err(format!(
                "unknown task '{s}' (expected vagrant[:NAME], host:DEST, \
                 piwik-config, install or uninstall)"
            )),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vagrant(name) if name.is_empty() => write!(f, "vagrant"),
            Self::Vagrant(name) => write!(f, "vagrant:{name}"),
            Self::Host(dest) => write!(f, "host:{dest}"),
            Self::PiwikConfig => write!(f, "piwik-config"),
            Self::Install => write!(f, "install"),
            Self::Uninstall => write!(f, "uninstall"),
        }
    }
}

#[derive(Parser)]
#[command(name = "piwik-deploy")]
#[command(about = "Provision a LAMP host and install Piwik on it")]
struct Cli {
    /// Tasks to run in order: vagrant[:NAME], host:[USER@]HOST[:PORT],
    /// piwik-config, install, uninstall
    #[arg(required = true)]
    tasks: Vec<Task>,

    /// Print remote commands instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Do not ask before uninstalling
    #[arg(long)]
    yes: bool,

    /// Take the first site's e-commerce flag from the
    /// configuration instead of the site name
    #[arg(long)]
    correct_ecommerce_flag: bool,
}

/// State shared by the tasks of one invocation.
#[derive(Debug, Default)]
pub struct Runbook {
    target: Option<Target>,
    config: Option<PiwikConfig>,
    dry_run: bool,
    assume_yes: bool,
    correct_ecommerce_flag: bool,
}

impl Runbook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub const fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    #[must_use]
    pub const fn correct_ecommerce_flag(mut self, correct: bool) -> Self {
        self.correct_ecommerce_flag = correct;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: PiwikConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub const fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> Option<&PiwikConfig> {
        self.config.as_ref()
    }

    /// Parse CLI arguments and run the tasks they name.
    pub fn run() -> DeployResult<()> {
        let cli = Cli::parse();

        let mut runbook = Self::new()
            .dry_run(cli.dry_run)
            .assume_yes(cli.yes)
            .correct_ecommerce_flag(cli.correct_ecommerce_flag);

        for task in &cli.tasks {
            runbook.run_task(task)?;
        }
        Ok(())
    }

    pub fn run_task(&mut self, task: &Task) -> DeployResult<TaskOutcome> {
        info!(%task, "running task");
        match task {
            Task::Vagrant(name) => {
                self.target = Some(Target::vagrant(name)?);
                self.log_target();
                Ok(TaskOutcome::Completed)
            }
            Task::Host(dest) => {
                self.target = Some(Target::remote(dest)?);
                self.log_target();
                Ok(TaskOutcome::Completed)
            }
            Task::PiwikConfig => {
                let config = PiwikConfig::from_env()?;
                debug!(config = %serde_json::to_string(&config)?, "piwik configuration");
                self.config = Some(config);
                Ok(TaskOutcome::Completed)
            }
            Task::Install => self.install(),
            Task::Uninstall => self.uninstall(),
        }
    }

    fn log_target(&self) {
        if let Some(target) = &self.target {
            info!(
                host = %target.host,
                port = target.port,
                user = %target.user,
                "deployment target resolved"
            );
        }
    }

    fn resolved_target(&self) -> DeployResult<&Target> {
        self.target.as_ref().ok_or(DeployError::NoTarget)
    }

    fn remote(&self, target: &Target) -> DeployResult<Box<dyn Remote>> {
        if self.dry_run {
            return Ok(Box::new(DryRun::new(&format!("{}@{}", target.user, target.host))));
        }
        if !cmd::command_exists("ssh") {
            return Err(DeployError::CommandNotFound("ssh".into()));
        }
        Ok(Box::new(target.session()))
    }

    /// Provision the target and run the install wizard.
    pub fn install(&self) -> DeployResult<TaskOutcome> {
        let Some(config) = install::require_config(self.config.as_ref()) else {
            return Ok(TaskOutcome::NotConfigured);
        };
        let target = self.resolved_target()?;
        let remote = self.remote(target)?;

        let mut wizard = Wizard::new(config);
        if self.correct_ecommerce_flag {
            wizard = wizard.correct_ecommerce_flag();
        }

        if self.dry_run {
            eprintln!("=== Dry run: no changes will be made ===");
            eprintln!();
            install::install(remote.as_ref(), None, target, config, wizard)?;
            print_wizard_plan(&wizard, config);
        } else {
            let mut browser = HttpBrowser::new()?;
            install::install(remote.as_ref(), Some(&mut browser as &mut dyn Browser), target, config, wizard)?;

            eprintln!();
            eprintln!("========================================");
            eprintln!("Piwik installed successfully!");
            eprintln!("========================================");
            eprintln!();
            eprintln!("URL: {}", config.base_url);
            eprintln!("Admin: {}", config.admin_user);
            eprintln!();
        }

        Ok(TaskOutcome::Completed)
    }

    /// Remove what `install` created, after confirmation.
    pub fn uninstall(&self) -> DeployResult<TaskOutcome> {
        let Some(config) = install::require_config(self.config.as_ref()) else {
            return Ok(TaskOutcome::NotConfigured);
        };
        let target = self.resolved_target()?;

        if !self.dry_run && !self.assume_yes {
            eprintln!(
                "WARNING: This will drop database '{}' and delete {} on {}",
                config.database_name,
                config.document_root(),
                target.host
            );
            eprintln!();
            eprint!("Are you sure? Type 'yes' to confirm: ");
            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            if input.trim() != "yes" {
                eprintln!("Aborted.");
                return Ok(TaskOutcome::Aborted);
            }
        }

        let remote = self.remote(target)?;
        install::uninstall(remote.as_ref(), target, config)?;

        eprintln!();
        eprintln!("Cleanup complete!");
        Ok(TaskOutcome::Completed)
    }
}

fn print_wizard_plan(wizard: &Wizard<'_>, config: &PiwikConfig) {
    eprintln!();
    eprintln!("--- Install wizard steps that would be performed ---");
    for line in wizard_plan(wizard, config) {
        eprintln!("{line}");
    }
}

/// What the warm-up and the wizard would do, one line per action.
fn wizard_plan(wizard: &Wizard<'_>, config: &PiwikConfig) -> Vec<String> {
    let mut lines = vec![format!("GET {}", install::warm_up_url(config))];
    lines.extend(install::writable_dir_commands(config).into_iter().map(|c| format!("run {c}")));

    for step in Step::sequence() {
        lines.push(format!("GET {}", config.page_url(step.path())));
        if let Some(form) = step.form_name() {
            let fields: Vec<&str> = wizard.fields(step).iter().map(|(f, _)| *f).collect();
            lines.push(format!("   submit {form}: {}", fields.join(", ")));
        }
    }
    lines
}
