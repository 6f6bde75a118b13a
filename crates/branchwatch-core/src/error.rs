use thiserror::Error;

/// Failure kinds of a single check run. None of them is recoverable: the
/// caller aborts the run and emits no output.
#[derive(Debug, Error)]
pub enum Error {
    /// The `source` block is inconsistent (e.g. `paths` without `pronly`).
    #[error("invalid source configuration: {0}")]
    Configuration(String),

    /// Connection failure or a non-2xx response.
    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },

    /// A payload or version token could not be decoded.
    #[error("could not decode {what}: {detail}")]
    Decode { what: String, detail: String },

    /// The server returned something this resource deliberately does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    pub fn transport(url: impl Into<String>, detail: impl ToString) -> Self {
        Error::Transport {
            url: url.into(),
            detail: detail.to_string(),
        }
    }

    pub fn decode(what: impl Into<String>, detail: impl ToString) -> Self {
        Error::Decode {
            what: what.into(),
            detail: detail.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
