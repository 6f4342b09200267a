use std::process::ExitStatus;

pub type DeployResult<T> = Result<T, DeployError>;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("command failed: {command}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("SSH connection failed: {0}")]
    SshFailed(String),

    #[error("invalid deployment target: {0}")]
    InvalidTarget(String),

    #[error("no deployment target, run the \"vagrant\" or \"host:\" task first")]
    NoTarget,

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("form '{0}' not found on page")]
    FormNotFound(String),

    #[error("field '{field}' not found in form '{form}'")]
    FieldNotFound { form: String, field: String },

    #[error("option '{value}' not available for field '{field}'")]
    OptionNotFound { field: String, value: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid .env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
