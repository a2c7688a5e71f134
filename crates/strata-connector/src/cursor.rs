//! Per-asset listing position.

use serde::{Deserialize, Serialize};

/// Where the next listing pass of an asset starts.
///
/// Holds a continuation token while a pass is in progress and nothing once a
/// pass has run to completion. The lister advances the cursor only after
/// every key of a page has been handed out, so a consumer that stops
/// mid-page sees that page again on the next pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCursor {
    continuation_token: Option<String>,
}

impl ListingCursor {
    /// A cursor at the beginning of the listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cursor resuming from a previously saved token.
    pub fn resume_from(token: impl Into<String>) -> Self {
        Self {
            continuation_token: Some(token.into()),
        }
    }

    /// The token the next pass starts from, if a pass is in progress.
    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    /// Whether the next pass resumes an unfinished one.
    pub fn is_resuming(&self) -> bool {
        self.continuation_token.is_some()
    }

    /// Moves the cursor back to the beginning.
    pub fn reset(&mut self) {
        self.continuation_token = None;
    }

    pub(crate) fn advance(&mut self, token: String) {
        self.continuation_token = Some(token);
    }

    pub(crate) fn complete(&mut self) {
        self.continuation_token = None;
    }
}
