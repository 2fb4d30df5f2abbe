use crate::domain::error::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("no wishlist item matches '{0}'")]
    ItemNotFound(String),

    #[error("'{query}' matches {count} items: {candidates}")]
    AmbiguousItem {
        query: String,
        count: usize,
        candidates: String,
    },

    #[error("page render error: {0}")]
    Render(#[from] minijinja::Error),

    #[error("page render error: {0}")]
    RenderJson(#[source] serde_json::Error),

    #[error("page I/O error: {0}")]
    PageIo(#[source] std::io::Error),
}
