//! On-disk lookaside cache.
//!
//! One file per key under a directory. The presence of the file is the only
//! hit signal: there is no expiry, checksum, or version. A miss runs the
//! supplied producer and persists its result before handing it back, so an
//! interrupted run resumes from whatever was already written.
//!
//! Concurrent runs against the same directory are not supported; the last
//! writer wins.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// How a cache key is turned into a file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStyle {
    Verbatim,
    Lowercase,
}

impl KeyStyle {
    fn normalize(self, key: &str) -> String {
        match self {
            KeyStyle::Verbatim => key.to_string(),
            KeyStyle::Lowercase => key.to_lowercase(),
        }
    }
}

/// Serialization strategy for cache files.
pub trait Codec {
    fn extension(&self) -> &str;
    fn encode<T: Serialize>(&self, value: &T) -> Result<String>;
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T>;
}

/// Pretty-printed JSON (two-space indent) with object keys sorted at every
/// level, so unchanged inputs produce byte-identical files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortedJson;

impl Codec for SortedJson {
    fn extension(&self) -> &str {
        "json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<String> {
        let value = sort_keys(serde_json::to_value(value)?);
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        Ok(serde_json::from_str(text)?)
    }
}

fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(String, serde_json::Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_keys).collect())
        }
        other => other,
    }
}

/// Whether a value came from disk or from the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Fetched,
}

/// A directory of cached values addressed by string key.
#[derive(Debug, Clone)]
pub struct KeyedCache<C: Codec = SortedJson> {
    dir: PathBuf,
    key_style: KeyStyle,
    suffix: String,
    codec: C,
}

impl KeyedCache<SortedJson> {
    /// A sorted-JSON cache writing `{dir}/{key}{suffix}.json`.
    pub fn json(dir: impl Into<PathBuf>, key_style: KeyStyle, suffix: &str) -> Self {
        Self::with_codec(dir, key_style, suffix, SortedJson)
    }
}

impl<C: Codec> KeyedCache<C> {
    pub fn with_codec(dir: impl Into<PathBuf>, key_style: KeyStyle, suffix: &str, codec: C) -> Self {
        Self {
            dir: dir.into(),
            key_style,
            suffix: suffix.to_string(),
            codec,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(
            "{}{}.{}",
            self.key_style.normalize(key),
            self.suffix,
            self.codec.extension()
        ))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    /// Load a cached value, or `None` when no file exists for `key`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(Some(self.codec.decode(&text)?))
    }

    pub fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let text = self.codec.encode(value)?;
        std::fs::write(self.path_for(key), text)?;
        Ok(())
    }

    /// Return the cached value for `key`, or run `fetch`, persist its
    /// result, and return it.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Result<(T, CacheOutcome)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.load(key)? {
            return Ok((value, CacheOutcome::Hit));
        }
        let value = fetch().await?;
        self.store(key, &value)?;
        Ok((value, CacheOutcome::Fetched))
    }
}
