#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Bucket client trait, paged listing and object retrieval.
pub mod client;
/// Object storage provider factories.
pub mod providers;
/// Error type shared by the client and providers.
pub mod types;

#[doc(hidden)]
pub mod prelude;

/// Tracing target for object-store operations.
pub const TRACING_TARGET: &str = "strata_object";
