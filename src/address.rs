//! Address type naming a single endpoint.
//!
//! Example: `/composition/layers/1/video/opacity`
//!
//! Addresses compare segment by segment (split on `/`) rather than byte by
//! byte, so everything living under one path prefix sorts contiguously:
//! `/a/b` < `/a/b/y` < `/a/b-c/x`. Plain byte order would put `/a/b-c/x`
//! between `/a/b` and `/a/b/y`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Everything before the final segment, or `None` for a single segment.
    pub fn parent(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(parent, _)| parent)
    }

    /// Final path segment.
    pub fn leaf(&self) -> &str {
        self.0.rsplit_once('/').map(|(_, leaf)| leaf).unwrap_or(&self.0)
    }

    /// True if `prefix` names this address or one of its ancestors.
    ///
    /// `/a` is a prefix of `/a` and `/a/x` but not of `/ab/x`.
    pub fn has_segment_prefix(&self, prefix: &str) -> bool {
        match self.0.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
            None => false,
        }
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        segment_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Segment-wise comparison used for every address ordering in the crate.
pub fn segment_cmp(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/'))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn orders_by_segment_so_prefixes_stay_contiguous() {
        let mut addrs: Vec<Address> = ["/a/b-c/x", "/a/x", "/a/b/y", "/a/b", "/a"]
            .into_iter()
            .map(Address::from)
            .collect();
        addrs.sort();

        let sorted: Vec<&str> = addrs.iter().map(Address::as_str).collect();
        assert_eq!(sorted, vec!["/a", "/a/b", "/a/b/y", "/a/b-c/x", "/a/x"]);
    }

    #[test]
    fn segment_prefix_respects_boundaries() {
        let addr = Address::from("/a/b/y");
        assert!(addr.has_segment_prefix("/a"));
        assert!(addr.has_segment_prefix("/a/b"));
        assert!(addr.has_segment_prefix("/a/b/y"));
        assert!(addr.has_segment_prefix("/a/b/"));
        assert!(!Address::from("/ab/x").has_segment_prefix("/a"));
    }

    #[test]
    fn splits_parent_and_leaf() {
        let addr = Address::from("/composition/layers/1/video/opacity");
        assert_eq!(addr.parent(), Some("/composition/layers/1/video"));
        assert_eq!(addr.leaf(), "opacity");
        assert_eq!(Address::from("bare").parent(), None);
        assert_eq!(Address::from("bare").leaf(), "bare");
    }
}
