//! Bucket client for AWS S3 and S3-compatible stores such as MinIO.

use derive_more::Deref;
use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};

use super::Client;
use crate::TRACING_TARGET;
use crate::client::ObjectStoreClient;
use crate::types::Error;

/// Where and as whom the connector reads a bucket.
///
/// Keys left unset are resolved by the AWS credential chain when requests
/// are signed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Credentials {
    pub bucket: String,
    /// Defaults to `us-east-1`.
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint; `http://` endpoints are allowed without TLS.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl S3Credentials {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: default_region(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_static_keys(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    fn to_builder(&self) -> AmazonS3Builder {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&self.bucket)
            .with_region(&self.region);

        if let Some(endpoint) = &self.endpoint {
            builder = builder
                .with_allow_http(endpoint.starts_with("http://"))
                .with_endpoint(endpoint);
        }

        if let Some(key) = &self.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(secret) = &self.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(token) = &self.session_token {
            builder = builder.with_token(token);
        }

        builder
    }
}

/// [`ObjectStoreClient`] over an S3 bucket.
#[derive(Debug, Deref)]
pub struct S3Provider(ObjectStoreClient);

impl S3Provider {
    pub fn into_inner(self) -> ObjectStoreClient {
        self.0
    }
}

impl Client for S3Provider {
    type Credentials = S3Credentials;

    const ID: &str = "s3";

    async fn connect(creds: &Self::Credentials) -> Result<Self, Error> {
        if creds.bucket.is_empty() {
            return Err(Error::connect("bucket name is empty", Self::ID, false));
        }

        let store = creds
            .to_builder()
            .build()
            .map_err(|e| Error::connect(e.to_string(), Self::ID, false).with_source(e))?;

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %creds.bucket,
            region = %creds.region,
            endpoint = ?creds.endpoint,
            "S3 client built"
        );

        Ok(Self(ObjectStoreClient::new(creds.bucket.clone(), store)))
    }
}
