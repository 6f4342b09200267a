use piwik_deploy::error::DeployError;

#[test]
fn display_command_not_found() {
    let err = DeployError::CommandNotFound("vagrant".into());
    assert_eq!(err.to_string(), "command not found: vagrant");
}

#[test]
fn display_ssh_failed() {
    let err = DeployError::SshFailed("timeout".into());
    assert_eq!(err.to_string(), "SSH connection failed: timeout");
}

#[test]
fn display_invalid_target() {
    let err = DeployError::InvalidTarget("root@".into());
    assert_eq!(err.to_string(), "invalid deployment target: root@");
}

#[test]
fn display_no_target() {
    let err = DeployError::NoTarget;
    assert!(err.to_string().starts_with("no deployment target"));
}

#[test]
fn display_missing_parameter() {
    let err = DeployError::MissingParameter("admin_email".into());
    assert_eq!(err.to_string(), "missing parameter: admin_email");
}

#[test]
fn display_form_not_found() {
    let err = DeployError::FormNotFound("databasesetupform".into());
    assert_eq!(err.to_string(), "form 'databasesetupform' not found on page");
}

#[test]
fn display_field_not_found() {
    let err = DeployError::FieldNotFound {
        form: "generalsetupform".into(),
        field: "email".into(),
    };
    assert_eq!(
        err.to_string(),
        "field 'email' not found in form 'generalsetupform'"
    );
}

#[test]
fn display_option_not_found() {
    let err = DeployError::OptionNotFound {
        field: "timezone".into(),
        value: "Mars/Olympus".into(),
    };
    assert_eq!(
        err.to_string(),
        "option 'Mars/Olympus' not available for field 'timezone'"
    );
}

#[test]
fn display_other() {
    let err = DeployError::Other("custom error".into());
    assert_eq!(err.to_string(), "custom error");
}

#[test]
fn from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err: DeployError = io_err.into();
    assert!(matches!(err, DeployError::Io(_)));
}

#[test]
fn from_json_error() {
    let json_err = serde_json::from_str::<Vec<u64>>("invalid").unwrap_err();
    let err: DeployError = json_err.into();
    assert!(matches!(err, DeployError::Json(_)));
}
