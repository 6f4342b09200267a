use tracing::info;

use crate::cmd::quote;
use crate::error::DeployResult;
use crate::ssh::Remote;

/// Make `locale` (e.g. `fr_FR.UTF-8`) available and the system
/// default.
pub fn locale(remote: &dyn Remote, locale: &str) -> DeployResult<()> {
    let available = remote.exec("locale -a")?;
    if is_available(&available, locale) {
        info!(%locale, "locale already generated");
    } else {
        info!(%locale, "generating locale");
        let charset = locale.split_once('.').map_or("UTF-8", |(_, c)| c);
        let entry = format!("{locale} {charset}");
        remote.exec(&format!(
            "grep -qx {entry} /etc/locale.gen || echo {entry} >> /etc/locale.gen",
            entry = quote(&entry)
        ))?;
        remote.exec("locale-gen")?;
    }
    remote.exec(&format!("update-locale LANG={}", quote(locale)))?;
    Ok(())
}

/// Whether `locale -a` output lists `locale`. glibc normalizes
/// `fr_FR.UTF-8` to `fr_FR.utf8`, so compare case-insensitively
/// and ignore dashes.
#[must_use]
pub fn is_available(locale_list: &str, locale: &str) -> bool {
    let wanted = normalize(locale);
    locale_list.lines().any(|l| normalize(l.trim()) == wanted)
}

fn normalize(locale: &str) -> String {
    locale.replace('-', "").to_ascii_lowercase()
}
