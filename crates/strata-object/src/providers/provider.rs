//! Provider trait for creating authenticated clients.

use std::future::Future;

use serde::de::DeserializeOwned;

use crate::types::Error;

/// Factory for an authenticated bucket client.
///
/// Implementations validate credentials and build the client; they do not
/// contact the store.
pub trait Client: Sized + Send + 'static {
    /// Strongly-typed credentials for this provider.
    type Credentials: DeserializeOwned + Send + Sync;

    /// Unique identifier (e.g. "s3").
    const ID: &str;

    /// Create a client instance.
    fn connect(creds: &Self::Credentials) -> impl Future<Output = Result<Self, Error>> + Send;
}
