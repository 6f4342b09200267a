use tracing::info;

use crate::cmd::quote;
use crate::error::DeployResult;
use crate::ssh::{Remote, Sensitive};

/// Credentials of the MySQL account that creates users and
/// databases.
#[derive(Debug, Clone, Copy)]
pub struct Admin<'a> {
    pub user: &'a str,
    pub password: &'a str,
}

/// Run `sql` through the `mysql` client and return its raw
/// tab-separated output. The admin password is masked in
/// anything printed or logged.
pub fn query(remote: &dyn Remote, admin: Admin<'_>, sql: &str) -> DeployResult<String> {
    query_with_secrets(remote, admin, &[], |_| sql.to_string())
}

/// Run the statement `sql` renders from `secrets`, masking them
/// along with the admin password.
fn query_with_secrets(
    remote: &dyn Remote,
    admin: Admin<'_>,
    secrets: &[&str],
    sql: impl Fn(&[&str]) -> String,
) -> DeployResult<String> {
    let mut values = vec![admin.password];
    values.extend_from_slice(secrets);

    let command = Sensitive::render(&values, |v| {
        format!(
            "mysql --batch --raw --skip-column-names --user={} --password={} --execute={}",
            quote(admin.user),
            quote(v[0]),
            quote(&sql(&v[1..]))
        )
    });
    remote.exec_sensitive(&command)
}

/// Quote a value as a SQL string literal.
#[must_use]
pub fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Quote a database name as a SQL identifier.
#[must_use]
pub fn identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub fn user_exists(remote: &dyn Remote, admin: Admin<'_>, name: &str) -> DeployResult<bool> {
    let output = query(
        remote,
        admin,
        &format!(
            "SELECT COUNT(*) FROM mysql.user WHERE User = {} AND Host = 'localhost';",
            literal(name)
        ),
    )?;
    Ok(output.trim() != "0" && !output.trim().is_empty())
}

/// Make sure a local MySQL user exists.
pub fn user(remote: &dyn Remote, admin: Admin<'_>, name: &str, password: &str) -> DeployResult<()> {
    if user_exists(remote, admin, name)? {
        info!(user = %name, "MySQL user already exists");
        return Ok(());
    }

    info!(user = %name, "creating MySQL user");
    query_with_secrets(remote, admin, &[password], |s| {
        format!(
            "CREATE USER {}@'localhost' IDENTIFIED BY {};",
            literal(name),
            literal(s[0])
        )
    })?;
    Ok(())
}

pub fn database_exists(remote: &dyn Remote, admin: Admin<'_>, name: &str) -> DeployResult<bool> {
    let output = query(remote, admin, &format!("SHOW DATABASES LIKE {};", literal(name)))?;
    Ok(output.lines().any(|l| l.trim() == name))
}

/// Make sure a database exists, with every privilege on it granted
/// to `owner`.
pub fn database(remote: &dyn Remote, admin: Admin<'_>, name: &str, owner: &str) -> DeployResult<()> {
    if database_exists(remote, admin, name)? {
        info!(database = %name, "database already exists");
        return Ok(());
    }

    info!(database = %name, %owner, "creating database");
    let db = identifier(name);
    query(
        remote,
        admin,
        &format!(
            "CREATE DATABASE {db} CHARACTER SET utf8 COLLATE utf8_general_ci; \
             GRANT ALL PRIVILEGES ON {db}.* TO {}@'localhost'; \
             FLUSH PRIVILEGES;",
            literal(owner)
        ),
    )?;
    Ok(())
}

pub fn drop_database(remote: &dyn Remote, admin: Admin<'_>, name: &str) -> DeployResult<()> {
    info!(database = %name, "dropping database");
    query(remote, admin, &format!("DROP DATABASE {};", identifier(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::DryRun;

    #[test]
    fn literal_escapes_quotes() {
        assert_eq!(literal("piwik"), "'piwik'");
        assert_eq!(literal("o'neil"), r"'o\'neil'");
        assert_eq!(literal(r"back\slash"), r"'back\\slash'");
    }

    #[test]
    fn identifier_escapes_backticks() {
        assert_eq!(identifier("piwik"), "`piwik`");
        assert_eq!(identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn new_user_password_is_masked() {
        let dry = DryRun::new("root@vm");
        let admin = Admin {
            user: "root",
            password: "ROOT-SECRET",
        };

        user(&dry, admin, "piwik", "APP-SECRET").unwrap();

        let printed = dry.transcript().join("\n");
        assert!(printed.contains("IDENTIFIED BY"));
        assert!(printed.contains("--password=********"));
        assert!(!printed.contains("ROOT-SECRET"));
        assert!(!printed.contains("APP-SECRET"));
    }
}
