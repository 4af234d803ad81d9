use thiserror::Error;

#[derive(Debug, Error)]
pub enum SprintError {
    #[error("not initialized: run 'sprint init'")]
    NotInitialized,

    #[error("story not found: {0}")]
    StoryNotFound(String),

    #[error("sprint not found: {0}")]
    SprintNotFound(String),

    #[error("retrospective not found for sprint: {0}")]
    RetrospectiveNotFound(String),

    #[error("standup not found for date: {0}")]
    StandupNotFound(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid story status: {0}")]
    InvalidStatus(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{kind} data is corrupt: {source}")]
    CorruptCollection {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} data has version {found}, newest supported is {supported}")]
    UnsupportedVersion {
        kind: String,
        found: u32,
        supported: u32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SprintError>;
