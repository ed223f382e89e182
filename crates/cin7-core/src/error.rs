use thiserror::Error;

#[derive(Debug, Error)]
pub enum Cin7Error {
    #[error("no package.json found in {0}; are you in a project directory?")]
    NotAProject(String),

    #[error("directory {0} already exists")]
    ProjectExists(String),

    #[error("invalid project name '{0}': use lowercase letters, digits, '-', '_' or '.'")]
    InvalidProjectName(String),

    #[error("invalid name '{0}': must be a PascalCase identifier")]
    InvalidIdentifier(String),

    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("unknown packages: {}", .0.join(", "))]
    UnknownPackages(Vec<String>),

    #[error("unknown type '{0}'")]
    UnknownGenerator(String),

    #[error("invalid layer '{layer}' for {kind}; available layers: {}", .available.join(", "))]
    InvalidLayer {
        kind: String,
        layer: String,
        available: Vec<String>,
    },

    #[error("cin7.config.js: {0}")]
    ConfigParse(String),

    #[error("no dev script found in package.json and no vite config present")]
    NoDevCommand,

    #[error("no local server detected on ports {0}")]
    NoLocalServer(String),

    #[error("'{0}' not found on PATH")]
    ToolNotFound(String),

    #[error("`{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("lighthouse report is malformed: {0}")]
    MalformedReport(String),

    #[error(transparent)]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Cin7Error>;
