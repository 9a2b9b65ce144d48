//! Partial-failure reporting for bulk operations.

use satchel::StoreError;

/// What happened to each item of a best-effort bulk operation, so callers
/// can inspect partial outcomes instead of getting a swallowed loop.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

/// One item the operation could not handle, with the error that stopped it.
#[derive(Debug)]
pub struct BulkFailure {
    pub id: String,
    pub error: StoreError,
}

impl BulkOutcome {
    pub fn record(&mut self, id: &str, result: Result<(), StoreError>) {
        match result {
            Ok(()) => self.succeeded.push(id.to_string()),
            Err(error) => self.failed.push(BulkFailure {
                id: id.to_string(),
                error,
            }),
        }
    }

    pub fn removed(&self) -> usize {
        self.succeeded.len()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn summary(&self) -> String {
        format!("removed {} of {}", self.removed(), self.attempted())
    }
}
