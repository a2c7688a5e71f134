//! Connector and asset configuration.
//!
//! [`ConnectorConfig`] and [`AssetOptions`] are the raw, serde-facing layers.
//! [`AssetConfig`] is the validated per-asset form: defaults resolved from the
//! connector and regexes compiled once, at registration.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::error::{Error, Result};

/// Options handed to the downstream reader, merged shallowly across layers.
pub type ReaderOptions = serde_json::Map<String, serde_json::Value>;

/// Upper bound S3 accepts for keys per listing page.
const MAX_KEYS_LIMIT: u32 = 1000;

const DEFAULT_ASSET_NAME: &str = "default";
const MATCH_ALL: &str = ".*";

fn default_name() -> String {
    "default".to_string()
}

fn default_scheme() -> String {
    "s3a".to_string()
}

fn default_delimiter() -> String {
    "/".to_string()
}

fn default_max_keys() -> u32 {
    MAX_KEYS_LIMIT
}

/// Connector-level configuration.
///
/// Values here are the outermost defaults: assets inherit `delimiter`,
/// `max_keys`, `reader_method` and `reader_options` unless they override them.
///
/// # Examples
///
/// ```
/// use strata_connector::ConnectorConfig;
///
/// let config: ConnectorConfig = serde_json::from_str(r#"{
///     "bucket": "my-bucket",
///     "reader_options": { "sep": "," },
///     "assets": {
///         "access_logs": { "prefix": "access_logs/", "regex_filter": "access_logs/2019.*\\.csv" }
///     }
/// }"#).unwrap();
///
/// assert_eq!(config.max_keys, 1000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ConnectorConfig {
    /// Connector name, used in logs.
    #[serde(default = "default_name")]
    pub name: String,

    /// Bucket every asset lives in.
    pub bucket: String,

    /// URI scheme written into batch descriptors.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Key delimiter used when listing.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Keys requested per listing page (1-1000).
    #[serde(default = "default_max_keys")]
    pub max_keys: u32,

    /// Reader method applied when neither the asset nor the call names one.
    #[serde(default)]
    pub reader_method: Option<String>,

    /// Outermost reader options layer.
    #[serde(default)]
    pub reader_options: ReaderOptions,

    /// Named assets. An empty map registers a single catch-all `default` asset.
    #[serde(default)]
    pub assets: BTreeMap<String, AssetOptions>,
}

impl ConnectorConfig {
    /// Creates a configuration for `bucket` with every default applied.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            name: default_name(),
            bucket: bucket.into(),
            scheme: default_scheme(),
            delimiter: default_delimiter(),
            max_keys: default_max_keys(),
            reader_method: None,
            reader_options: ReaderOptions::new(),
            assets: BTreeMap::new(),
        }
    }

    /// Sets the connector name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the URI scheme of produced descriptors.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Sets the default key delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Sets the default page size.
    pub fn with_max_keys(mut self, max_keys: u32) -> Self {
        self.max_keys = max_keys;
        self
    }

    /// Sets the default reader method.
    pub fn with_reader_method(mut self, reader_method: impl Into<String>) -> Self {
        self.reader_method = Some(reader_method.into());
        self
    }

    /// Sets the connector-level reader options.
    pub fn with_reader_options(mut self, reader_options: ReaderOptions) -> Self {
        self.reader_options = reader_options;
        self
    }

    /// Registers an asset.
    pub fn with_asset(mut self, name: impl Into<String>, options: AssetOptions) -> Self {
        self.assets.insert(name.into(), options);
        self
    }

    /// Validates connector-level values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the bucket, scheme or delimiter is
    /// empty, or `max_keys` is outside 1-1000.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(Error::invalid_config("bucket must not be empty"));
        }

        if self.scheme.is_empty() {
            return Err(Error::invalid_config("scheme must not be empty"));
        }

        if self.delimiter.is_empty() {
            return Err(Error::invalid_config("delimiter must not be empty"));
        }

        check_max_keys(self.max_keys, "connector")
    }

    /// Validates the configuration and resolves every asset.
    pub fn resolve_assets(&self) -> Result<BTreeMap<String, AssetConfig>> {
        self.validate()?;

        if self.assets.is_empty() {
            let options = AssetOptions::new("").with_regex_filter(MATCH_ALL);
            let asset = AssetConfig::resolve(DEFAULT_ASSET_NAME, &options, self)?;
            return Ok(BTreeMap::from([(DEFAULT_ASSET_NAME.to_string(), asset)]));
        }

        self.assets
            .iter()
            .map(|(name, options)| Ok((name.clone(), AssetConfig::resolve(name, options, self)?)))
            .collect()
    }
}

fn check_max_keys(max_keys: u32, scope: &str) -> Result<()> {
    if max_keys == 0 || max_keys > MAX_KEYS_LIMIT {
        return Err(Error::invalid_config(format!(
            "{scope} max_keys {max_keys} is invalid, must be between 1 and {MAX_KEYS_LIMIT}"
        )));
    }
    Ok(())
}

/// Raw per-asset configuration. Unset fields inherit from the connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetOptions {
    /// Key prefix the asset lives under.
    #[serde(default)]
    pub prefix: String,

    /// Key delimiter override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,

    /// Only keys matching this pattern belong to the asset. Defaults to `.*`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_filter: Option<String>,

    /// Pattern whose capture group becomes the partition id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_regex: Option<String>,

    /// Capture group of `partition_regex` to use. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_group_id: Option<usize>,

    /// Treat common prefixes ("folders") as the unit of retrieval.
    #[serde(default)]
    pub directory_assets: bool,

    /// Page size override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_keys: Option<u32>,

    /// Reader method override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_method: Option<String>,

    /// Asset-level reader options layer.
    #[serde(default)]
    pub reader_options: ReaderOptions,
}

impl AssetOptions {
    /// Creates options for an asset under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_regex_filter(mut self, pattern: impl Into<String>) -> Self {
        self.regex_filter = Some(pattern.into());
        self
    }

    pub fn with_partition_regex(mut self, pattern: impl Into<String>) -> Self {
        self.partition_regex = Some(pattern.into());
        self
    }

    pub fn with_match_group_id(mut self, group: usize) -> Self {
        self.match_group_id = Some(group);
        self
    }

    pub fn with_directory_assets(mut self, directory_assets: bool) -> Self {
        self.directory_assets = directory_assets;
        self
    }

    pub fn with_max_keys(mut self, max_keys: u32) -> Self {
        self.max_keys = Some(max_keys);
        self
    }

    pub fn with_reader_method(mut self, reader_method: impl Into<String>) -> Self {
        self.reader_method = Some(reader_method.into());
        self
    }

    pub fn with_reader_options(mut self, reader_options: ReaderOptions) -> Self {
        self.reader_options = reader_options;
        self
    }
}

/// Unit of retrieval of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
    /// Every object is one batch.
    File,
    /// Every common prefix is one batch.
    Directory,
}

/// Validated, immutable configuration of one registered asset.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    name: String,
    prefix: String,
    delimiter: String,
    regex_filter: Regex,
    partition_regex: Option<Regex>,
    match_group_id: usize,
    directory_assets: bool,
    max_keys: u32,
    reader_method: Option<String>,
    reader_options: ReaderOptions,
}

impl AssetConfig {
    /// Resolves `options` against the connector defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a pattern does not compile, the
    /// delimiter is empty, or `max_keys` is outside 1-1000.
    pub fn resolve(name: &str, options: &AssetOptions, connector: &ConnectorConfig) -> Result<Self> {
        let delimiter = options
            .delimiter
            .clone()
            .unwrap_or_else(|| connector.delimiter.clone());
        if delimiter.is_empty() {
            return Err(Error::invalid_config(format!(
                "asset '{name}' delimiter must not be empty"
            )));
        }

        let max_keys = options.max_keys.unwrap_or(connector.max_keys);
        check_max_keys(max_keys, &format!("asset '{name}'"))?;

        let filter = options.regex_filter.as_deref().unwrap_or(MATCH_ALL);
        // Checked on its own first so the group wrapper cannot be escaped.
        compile(name, "regex_filter", filter)?;
        let regex_filter = compile(name, "regex_filter", &format!("^(?:{filter})"))?;
        let partition_regex = options
            .partition_regex
            .as_deref()
            .map(|pattern| compile(name, "partition_regex", pattern))
            .transpose()?;

        Ok(Self {
            name: name.to_string(),
            prefix: options.prefix.clone(),
            delimiter,
            regex_filter,
            partition_regex,
            match_group_id: options.match_group_id.unwrap_or(1),
            directory_assets: options.directory_assets,
            max_keys,
            reader_method: options.reader_method.clone(),
            reader_options: options.reader_options.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn regex_filter(&self) -> &Regex {
        &self.regex_filter
    }

    pub fn partition_regex(&self) -> Option<&Regex> {
        self.partition_regex.as_ref()
    }

    pub fn match_group_id(&self) -> usize {
        self.match_group_id
    }

    pub fn directory_assets(&self) -> bool {
        self.directory_assets
    }

    pub fn max_keys(&self) -> u32 {
        self.max_keys
    }

    pub fn reader_method(&self) -> Option<&str> {
        self.reader_method.as_deref()
    }

    pub fn reader_options(&self) -> &ReaderOptions {
        &self.reader_options
    }

    /// Unit of retrieval of this asset.
    pub fn kind(&self) -> AssetKind {
        if self.directory_assets {
            AssetKind::Directory
        } else {
            AssetKind::File
        }
    }

    /// Whether `key` belongs to the asset.
    ///
    /// The filter is anchored at the start of the full key, not at the end.
    pub fn matches(&self, key: &str) -> bool {
        self.regex_filter.is_match(key)
    }
}

fn compile(asset: &str, field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        Error::invalid_config(format!(
            "asset '{asset}' {field} '{pattern}' does not compile: {e}"
        ))
    })
}
