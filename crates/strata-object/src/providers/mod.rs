//! Client trait and object storage providers.

mod provider;
mod s3;

pub use provider::Client;
pub use s3::{S3Credentials, S3Provider};
