use thiserror::Error;

/// Errors surfaced by storage, configuration and form validation.
///
/// The eligibility matcher and the text generators never produce these:
/// unparseable input degrades to fewer constraints instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// A record failed form validation (e.g. a blank name).
    #[error("{0}")]
    Invalid(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::Invalid(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
