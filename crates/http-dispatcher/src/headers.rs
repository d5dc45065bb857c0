//! Header map used by requests, responses and dispatcher defaults
//!
//! Backed by [`http::HeaderMap`], so names compare case-insensitively and a
//! name may carry several values (`set-cookie`, `vary`). Layering replaces
//! every value of a name with the values of the upper layer.

use std::collections::BTreeMap;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::response::Response;

/// Content type header name
pub const CONTENT_TYPE: &str = "content-type";

/// Content type injected for structured payloads
pub const APPLICATION_JSON: &str = "application/json";

/// Case-insensitive, multi-valued header map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct Headers {
    inner: HeaderMap,
}

fn parse(name: &str, value: &str) -> Response<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| HttpError::InvalidHeader(format!("'{}': {}", name, e)))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| HttpError::InvalidHeader(format!("'{}': {}", name, e)))?;
    Ok((header_name, header_value))
}

impl Headers {
    /// Empty header map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs; repeated names keep every value
    pub fn from_pairs<I, K, V>(pairs: I) -> Response<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            headers.append(name, value)?;
        }
        Ok(headers)
    }

    /// Set a header, replacing every previous value for the same name
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Response<()> {
        let (name, value) = parse(name.as_ref(), value.as_ref())?;
        self.inner.insert(name, value);
        Ok(())
    }

    /// Add a value, keeping the ones already present for the name
    pub fn append(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Response<()> {
        let (name, value) = parse(name.as_ref(), value.as_ref())?;
        self.inner.append(name, value);
        Ok(())
    }

    /// Builder-style [`Headers::insert`]
    pub fn with(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Response<Self> {
        self.insert(name, value)?;
        Ok(self)
    }

    /// First value of a header (any case)
    ///
    /// Values that are not visible ASCII are skipped.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(|value| value.to_str().ok())
    }

    /// Every value of a header, in the order received
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.inner
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }

    /// Whether a header is present (any case)
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Remove every value of a header, returning the first
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.inner
            .remove(name)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
    }

    /// Overlay `other` on top of `self`
    ///
    /// Names present in `other` lose all their values in `self`.
    pub fn extend(&mut self, other: &Headers) {
        for name in other.inner.keys() {
            let mut values = other.inner.get_all(name).iter();
            if let Some(first) = values.next() {
                self.inner.insert(name.clone(), first.clone());
            }
            for value in values {
                self.inner.append(name.clone(), value.clone());
            }
        }
    }

    /// Iterate `(name, value)` pairs, one per value; names are lower-case
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
    }

    /// Number of values, counting repeated names
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Underlying [`HeaderMap`]
    pub fn as_header_map(&self) -> &HeaderMap {
        &self.inner
    }

    /// Mutable access to the underlying [`HeaderMap`]
    pub fn header_map_mut(&mut self) -> &mut HeaderMap {
        &mut self.inner
    }
}

impl From<HeaderMap> for Headers {
    fn from(inner: HeaderMap) -> Self {
        Self { inner }
    }
}

impl From<Headers> for HeaderMap {
    fn from(headers: Headers) -> Self {
        headers.inner
    }
}

impl FromIterator<(HeaderName, HeaderValue)> for Headers {
    fn from_iter<I: IntoIterator<Item = (HeaderName, HeaderValue)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, String>> for Headers {
    type Error = HttpError;

    fn try_from(map: BTreeMap<String, String>) -> Response<Self> {
        Headers::from_pairs(map)
    }
}

impl From<Headers> for BTreeMap<String, String> {
    fn from(headers: Headers) -> Self {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers.iter() {
            map.entry(name.to_string())
                .and_modify(|joined| {
                    joined.push_str(", ");
                    joined.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
        map
    }
}
