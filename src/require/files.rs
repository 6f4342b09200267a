use tracing::info;

use crate::cmd::quote;
use crate::error::DeployResult;
use crate::ssh::{Remote, in_dir};

/// File name a download of `url` is saved under.
#[must_use]
pub fn file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// Download `url` into `dir` as `user`, unless the file is
/// already there. Returns the path of the file.
pub fn download(remote: &dyn Remote, user: &str, dir: &str, url: &str) -> DeployResult<String> {
    let name = file_name(url);
    let path = format!("{}/{name}", dir.trim_end_matches('/'));

    if remote.is_file(&path)? {
        info!(%path, "already downloaded");
        return Ok(path);
    }

    info!(%url, %path, "downloading");
    remote.exec_as(
        user,
        &in_dir(dir, &format!("wget --quiet --output-document={} {}", quote(name), quote(url))),
    )?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_from_url() {
        assert_eq!(file_name("http://builds.piwik.org/latest.zip"), "latest.zip");
        assert_eq!(file_name("https://x.org/a/b.tar.gz?sig=1"), "b.tar.gz");
    }
}
