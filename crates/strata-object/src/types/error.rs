//! Error type of the store boundary.

use std::fmt;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Point of the store interaction at which an [`Error`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Building a client from credentials; nothing was sent yet.
    Connect,
    /// A listing or retrieval call.
    Request,
}

/// Failure of a store call or of client construction.
///
/// `origin` names the component that raised it (a provider id, `bucket`, or
/// `object-store`). Calls are never retried here; `is_retryable` only tells
/// the caller whether repeating the call could succeed.
pub struct Error {
    stage: Stage,
    origin: String,
    message: String,
    source: Option<BoxedError>,
    retryable: bool,
}

impl Error {
    fn new(stage: Stage, origin: &str, message: impl fmt::Display, retryable: bool) -> Self {
        Self {
            stage,
            origin: origin.to_string(),
            message: message.to_string(),
            source: None,
            retryable,
        }
    }

    /// A listing or retrieval call failed.
    pub fn request(message: impl fmt::Display, origin: &str, retryable: bool) -> Self {
        Self::new(Stage::Request, origin, message, retryable)
    }

    /// A provider could not build its client.
    pub fn connect(message: impl fmt::Display, origin: &str, retryable: bool) -> Self {
        Self::new(Stage::Connect, origin, message, retryable)
    }

    /// A call named a bucket other than the one the client serves.
    pub fn bucket_mismatch(requested: &str, served: &str) -> Self {
        Self::request(
            format_args!("bucket '{requested}' is not served by this client (serves '{served}')"),
            "bucket",
            false,
        )
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The message without the origin tag.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Stage::Connect => write!(f, "[{}] cannot connect: {}", self.origin, self.message),
            Stage::Request => write!(f, "[{}] {}", self.origin, self.message),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("stage", &self.stage)
            .field("origin", &self.origin)
            .field("message", &self.message)
            .field("retryable", &self.retryable)
            .field("source", &self.source)
            .finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
