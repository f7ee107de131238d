use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Duplicate chunk id: {0}")]
    DuplicateId(String),

    #[error("Sub-chunk parent not found: {0}")]
    ParentNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
