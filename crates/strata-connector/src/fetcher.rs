//! Object retrieval for built descriptors.

use std::sync::Arc;

use strata_object::client::{BucketClient, GetOutput};

use crate::TRACING_TARGET;
use crate::descriptor::{BatchDescriptor, ObjectUri};
use crate::error::Result;

/// Cloneable handle that opens the objects descriptors point at.
///
/// It shares the connector's client but none of its listing state, so it can
/// be used while a batch stream holds the connector.
#[derive(Debug, Clone)]
pub struct ObjectFetcher {
    client: Arc<dyn BucketClient>,
}

impl ObjectFetcher {
    pub fn new(client: Arc<dyn BucketClient>) -> Self {
        Self { client }
    }

    /// Opens the object a descriptor points at.
    ///
    /// Issues a single retrieval call and returns the parsed URI with the
    /// object's headers and unread body.
    #[tracing::instrument(name = "connector.fetch_object", skip_all, fields(uri = %descriptor.object_uri))]
    pub async fn fetch(&self, descriptor: &BatchDescriptor) -> Result<(ObjectUri, GetOutput)> {
        let uri = descriptor.parse_uri()?;

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = uri.bucket(),
            key = uri.key(),
            "Fetching object"
        );

        let output = self.client.get_object(uri.bucket(), uri.key()).await?;
        Ok((uri, output))
    }
}
