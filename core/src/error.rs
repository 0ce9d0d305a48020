use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Invalid classifier pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type TriageResult<T> = Result<T, TriageError>;
