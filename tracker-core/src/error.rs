use std::path::PathBuf;

/// Every failure the tracker pipeline can report.
///
/// The scheduler catches all of these at the per-location boundary, so none
/// of them stops a run. Only the binary treats the config kinds as fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration missing: {0}")]
    ConfigMissing(String),

    #[error("configuration invalid: {0}")]
    ConfigInvalid(String),

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("unsupported payload format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("record shape invalid: {0}")]
    RecordShapeInvalid(String),

    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoFailure { path: path.into(), source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
