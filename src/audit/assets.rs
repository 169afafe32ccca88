//! Asset existence checks under the public root.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::core::errors::{LwaError, Result};
use crate::core::paths::join_posix;
use crate::scanner::asset_refs::normalize_asset_path;

/// String-keyed map that serializes in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert or overwrite in place; new keys go to the end.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// path -> exists
pub type StatusMap = OrderedMap<bool>;

impl StatusMap {
    /// Keys whose value is `false`, in map order.
    pub fn missing(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, ok)| !**ok)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn any_missing(&self) -> bool {
        self.iter().any(|(_, ok)| !*ok)
    }
}

/// Resolves relative asset paths against a public directory.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    public_root: PathBuf,
}

impl AssetResolver {
    /// The public directory must exist.
    pub fn new(public_root: &Path) -> Result<Self> {
        match fs::metadata(public_root) {
            Ok(meta) if meta.is_dir() => Ok(Self {
                public_root: public_root.to_path_buf(),
            }),
            Ok(_) => Err(LwaError::MissingRoot {
                role: "public",
                path: public_root.to_path_buf(),
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(LwaError::MissingRoot {
                role: "public",
                path: public_root.to_path_buf(),
            }),
            Err(source) => Err(LwaError::io(public_root, source)),
        }
    }

    pub fn public_root(&self) -> &Path {
        &self.public_root
    }

    /// One entry per input path, in input order: does `public_root/path` name a file.
    pub fn check<I, S>(&self, asset_paths: I) -> StatusMap
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        asset_paths
            .into_iter()
            .map(|rel| {
                let rel = rel.as_ref();
                let exists = join_posix(&self.public_root, rel).is_file();
                (rel.to_string(), exists)
            })
            .collect()
    }
}

/// Seed list followed by caller additions, normalized, first occurrence kept.
pub fn merge_required<S: AsRef<str>>(seed: &[S], extra: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(seed.len() + extra.len());
    for item in seed.iter().chain(extra) {
        let rel = normalize_asset_path(item.as_ref());
        if !rel.is_empty() && !out.iter().any(|existing| existing == rel) {
            out.push(rel.to_string());
        }
    }
    out
}
