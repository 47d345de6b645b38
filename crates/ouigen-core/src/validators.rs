//! HTTP validator storage for conditional requests.
//!
//! A [`Validators`] set holds the response headers recorded from the most
//! recent successful fetch, keyed by lowercase header name with a single
//! value per name. The `etag` and `last-modified` entries drive the
//! conditional-GET headers on the next request; everything else is carried
//! along opaquely.

use std::collections::BTreeMap;

/// Lowercase header name of the entity-tag validator.
pub const ETAG: &str = "etag";

/// Lowercase header name of the last-modified validator.
pub const LAST_MODIFIED: &str = "last-modified";

/// Header name → value mapping derived from the most recent successful
/// response. Empty when no cache exists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Validators(BTreeMap<String, String>);

impl Validators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Looks up a header value by name. Names are matched case-insensitively
    /// since the set stores lowercase keys.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Inserts a header value, replacing any previous value for the same
    /// name. Only the most recent value per name is retained.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// The entity-tag validator, if one was recorded.
    pub fn etag(&self) -> Option<&str> {
        self.get(ETAG)
    }

    /// The last-modified validator, if one was recorded.
    pub fn last_modified(&self) -> Option<&str> {
        self.get(LAST_MODIFIED)
    }

    /// Serializes the set as line-oriented `key=value` text, one header per
    /// line, for the headers entry of the cache artifact.
    pub fn to_lines(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.0 {
            out.push_str(name);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Parses the line-oriented `key=value` form written by [`to_lines`].
    ///
    /// Lines without a `=` and lines starting with `#` are ignored; values
    /// may themselves contain `=`. Keys are normalized to lowercase so
    /// artifacts written by older versions with mixed-case names stay
    /// readable.
    ///
    /// [`to_lines`]: Validators::to_lines
    pub fn from_lines(text: &str) -> Self {
        let mut set = Self::new();
        for line in text.lines() {
            if line.starts_with('#') {
                continue;
            }
            if let Some((name, value)) = line.split_once('=') {
                set.insert(name, value);
            }
        }
        set
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
