//! Convenience re-exports.

pub use crate::client::{
    BucketClient, GetOutput, ListPage, ListRequest, ListedObject, ObjectStoreClient,
};
pub use crate::providers::{Client, S3Credentials, S3Provider};
pub use crate::types::{Error, Stage};
