use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The endpoint could not be reached or refused the handshake.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The remote answered, but its ref advertisement was unusable.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid ref pattern '{pattern}': {source}")]
    PatternCompile {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unsupported remote URL: {0}")]
    UnsupportedUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Connection(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
