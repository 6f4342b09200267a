#![allow(dead_code)]

use std::cell::RefCell;

use piwik_deploy::error::DeployResult;
use piwik_deploy::ssh::{Remote, Sensitive};
use piwik_deploy::wizard::browser::Browser;
use piwik_deploy::wizard::form::{Page, Submission};

/// A command seen by [`RecordingRemote`], with the login it ran
/// under (`None` for the connection user).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed {
    pub user: Option<String>,
    pub command: String,
}

/// Records every remote action. Commands return the output of the
/// first canned response whose needle they contain, or nothing.
#[derive(Default)]
pub struct RecordingRemote {
    pub executed: RefCell<Vec<Executed>>,
    pub written: RefCell<Vec<(String, String)>>,
    responses: Vec<(String, String)>,
}

impl RecordingRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, needle: &str, output: &str) -> Self {
        self.responses.push((needle.to_string(), output.to_string()));
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.executed
            .borrow()
            .iter()
            .map(|e| e.command.clone())
            .collect()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.commands().iter().any(|c| c.contains(needle))
    }

    /// Index of the first command containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.contains(needle))
    }

    pub fn is_untouched(&self) -> bool {
        self.executed.borrow().is_empty() && self.written.borrow().is_empty()
    }

    fn answer(&self, command: &str) -> String {
        self.responses
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default()
    }
}

impl Remote for RecordingRemote {
    fn exec(&self, command: &str) -> DeployResult<String> {
        self.executed.borrow_mut().push(Executed {
            user: None,
            command: command.to_string(),
        });
        Ok(self.answer(command))
    }

    fn exec_interactive(&self, command: &str) -> DeployResult<()> {
        self.exec(command).map(|_| ())
    }

    fn exec_as(&self, user: &str, command: &str) -> DeployResult<String> {
        self.executed.borrow_mut().push(Executed {
            user: Some(user.to_string()),
            command: command.to_string(),
        });
        Ok(self.answer(command))
    }

    fn exec_sensitive(&self, command: &Sensitive) -> DeployResult<String> {
        self.exec(command.command())
    }

    fn write_file(&self, content: &str, path: &str) -> DeployResult<()> {
        self.written
            .borrow_mut()
            .push((path.to_string(), content.to_string()));
        Ok(())
    }
}

/// Serves canned pages by URL suffix and records what is sent.
#[derive(Default)]
pub struct FakeBrowser {
    pages: Vec<(String, String)>,
    pub opened: Vec<String>,
    pub sent: Vec<Submission>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url_suffix: &str, body: &str) -> Self {
        self.pages.push((url_suffix.to_string(), body.to_string()));
        self
    }
}

impl Browser for FakeBrowser {
    fn open(&mut self, url: &str) -> DeployResult<Page> {
        self.opened.push(url.to_string());
        let body = self
            .pages
            .iter()
            .find(|(suffix, _)| url.ends_with(suffix.as_str()))
            .map_or("<html><body></body></html>", |(_, body)| body.as_str());
        Ok(Page::new(url, body))
    }

    fn send(&mut self, submission: &Submission) -> DeployResult<Page> {
        self.sent.push(submission.clone());
        Ok(Page::new(&submission.url, "<html><body>ok</body></html>"))
    }
}

pub const DATABASE_SETUP_PAGE: &str = r#"
<html><body>
<form name="databasesetupform" method="post" action="index.php?action=databaseSetup">
  <input type="text" name="host" value="localhost">
  <input type="text" name="username">
  <input type="password" name="password">
  <input type="text" name="dbname">
  <input type="text" name="tables_prefix" value="matomo_">
  <select name="adapter">
    <option value="PDO_MYSQL">PDO\MYSQL</option>
    <option value="MYSQLI">MYSQLI</option>
  </select>
  <input type="submit" name="submit" value="Next">
</form>
</body></html>"#;

pub const GENERAL_SETUP_PAGE: &str = r#"
<html><body>
<form name="generalsetupform" method="post" action="index.php?action=generalSetup&amp;module=Installation">
  <input type="text" name="login">
  <input type="password" name="password">
  <input type="password" name="password_bis">
  <input type="text" name="email">
  <input type="checkbox" name="subscribe_newsletter_security" value="1" checked>
  <input type="checkbox" name="subscribe_newsletter_community" value="1" checked>
  <input type="submit" name="submit" value="Next">
</form>
</body></html>"#;

pub const WEBSITE_SETUP_PAGE: &str = r#"
<html><body>
<form name="websitesetupform" method="post" action="index.php?action=firstWebsiteSetup&amp;module=Installation">
  <input type="text" name="siteName">
  <input type="text" name="url" value="http://">
  <select name="timezone">
    <option value="UTC">UTC</option>
    <optgroup label="Europe">
      <option value="Europe/Paris">Paris</option>
      <option value="Europe/Berlin">Berlin</option>
    </optgroup>
  </select>
  <select name="ecommerce">
    <option value="0" selected>Not an Ecommerce site</option>
    <option value="1">Ecommerce enabled</option>
  </select>
  <input type="submit" name="submit" value="Next">
</form>
</body></html>"#;

/// A browser serving the three wizard forms.
pub fn wizard_browser() -> FakeBrowser {
    FakeBrowser::new()
        .page("action=databaseSetup", DATABASE_SETUP_PAGE)
        .page("action=generalSetup&module=Installation", GENERAL_SETUP_PAGE)
        .page(
            "action=firstWebsiteSetup&module=Installation",
            WEBSITE_SETUP_PAGE,
        )
}

/// Value of `field` in a submission.
pub fn field<'a>(submission: &'a Submission, field: &str) -> Option<&'a str> {
    submission
        .fields
        .iter()
        .find(|(k, _)| k == field)
        .map(|(_, v)| v.as_str())
}
