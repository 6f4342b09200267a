use std::path::Path;

use piwik_deploy::Runbook;
use piwik_deploy::config::load_env_file;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Variables may also come from the shell.
    load_env_file(Path::new(".env"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    Runbook::run()?;
    Ok(())
}
