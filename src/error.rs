use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpmError {
    /// Spawn failure, nonzero exit, or timeout of an invoked executable
    #[error("Command '{command}' failed: {reason}")]
    ExternalTool { command: String, reason: String },

    /// Tool or network output that could not be decoded
    #[error("Unexpected response from {source_name}: {message}")]
    ResponseFormat {
        source_name: String,
        message: String,
    },

    #[error("Specfile not found: {path}")]
    SpecfileMissing { path: PathBuf },

    #[error("Lockfile not found: {path}")]
    LockfileMissing { path: PathBuf },

    #[error("Parsing error in '{file}': {message}")]
    Parse { file: String, message: String },

    #[error("IO error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    StdIo(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    RemoteFetch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("KDL parse error: {0}")]
    Kdl(#[from] kdl::KdlError),

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Could not detect a language in '{}'; pass --lang (see `upm backends`)", .0.display())]
    LanguageUndetected(PathBuf),

    #[error("No such package: {0}")]
    PackageNotFound(String),

    #[error("Backend '{backend}' does not support {operation}")]
    Unsupported { backend: String, operation: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl UpmError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn response(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::ResponseFormat {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpmError>;
