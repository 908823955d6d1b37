use thiserror::Error;

#[derive(Error, Debug)]
pub enum MurmurError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid {0}")]
    Invalid(String),

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("Self reference rejected: {0}")]
    SelfReferenceRejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl MurmurError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        MurmurError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        MurmurError::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        MurmurError::Invalid(reason.into())
    }

    /// True for the caller-error family (unknown id, bad input, duplicate,
    /// self reference). Those never touch durable state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            MurmurError::NotFound { .. }
                | MurmurError::Invalid(_)
                | MurmurError::AlreadyExists { .. }
                | MurmurError::SelfReferenceRejected(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MurmurError>;
