use thiserror::Error;

/// What can go wrong talking to the document store. Read-side aggregation in
/// callers is expected to degrade on `Io` rather than propagate it; `NotFound`
/// and `Permission` are soft failures in bulk cleanup flows and hard ones in
/// direct edits.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("store request failed: {0}")]
    Io(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, StoreError::Permission(_))
    }
}
