use super::model::isbn::Isbn;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("invalid ISBN: '{0}'")]
    InvalidIsbn(String),

    #[error("invalid sort key: '{0}'")]
    InvalidSortKey(String),

    #[error("holding of {isbn} at {library}/{branch} has neither call number nor digital URL")]
    MissingShelfLocation {
        isbn: Isbn,
        library: String,
        branch: String,
    },

    #[error("unknown library: {0}")]
    UnknownLibrary(String),

    #[error("branch name must not be empty")]
    EmptyBranchName,
}
