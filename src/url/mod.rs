//! URL handling module
//!
//! This module provides the crawl's URL identity (`CrawlUrl`), link normalization,
//! and origin-prefix extraction used by the domain visitor.

mod domain;
mod normalize;

use std::fmt;
use std::hash::{Hash, Hasher};

// Re-export main functions
pub use domain::{extract_domain, origin_prefix};
pub use normalize::{DefaultLinkNormalizer, LinkNormalizer};

/// A link to crawl together with the number of hops taken to reach it
///
/// Equality and hashing only consider the link: the depth records how the URL
/// was discovered, not which resource it names, so two discovery paths to the
/// same link are the same key.
#[derive(Debug, Clone)]
pub struct CrawlUrl {
    link: String,
    depth: u32,
}

impl CrawlUrl {
    pub fn new(link: impl Into<String>, depth: u32) -> Self {
        Self {
            link: link.into(),
            depth,
        }
    }

    /// The crawl's start point, at depth 0
    pub fn root(link: impl Into<String>) -> Self {
        Self::new(link, 0)
    }

    /// A link discovered on this URL's page, one hop deeper
    pub fn child(&self, link: impl Into<String>) -> Self {
        Self::new(link, self.depth + 1)
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}

impl PartialEq for CrawlUrl {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
    }
}

impl Eq for CrawlUrl {}

impl Hash for CrawlUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.link.hash(state);
    }
}

impl fmt::Display for CrawlUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (depth {})", self.link, self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_root_has_depth_zero() {
        let root = CrawlUrl::root("http://test.com");
        assert_eq!(root.depth(), 0);
        assert_eq!(root.link(), "http://test.com");
    }

    #[test]
    fn test_child_is_one_hop_deeper() {
        let root = CrawlUrl::root("http://test.com");
        let child = root.child("http://test.com/a");
        let grandchild = child.child("http://test.com/b");

        assert_eq!(child.depth(), root.depth() + 1);
        assert_eq!(grandchild.depth(), 2);
    }

    #[test]
    fn test_equality_ignores_depth() {
        let shallow = CrawlUrl::new("http://test.com/page", 1);
        let deep = CrawlUrl::new("http://test.com/page", 5);
        assert_eq!(shallow, deep);

        let mut set = HashSet::new();
        set.insert(shallow);
        assert!(!set.insert(deep));
    }

    #[test]
    fn test_different_links_differ() {
        assert_ne!(
            CrawlUrl::new("http://test.com/a", 1),
            CrawlUrl::new("http://test.com/b", 1)
        );
    }

    #[test]
    fn test_display() {
        let url = CrawlUrl::new("http://test.com/a", 2);
        assert_eq!(url.to_string(), "http://test.com/a (depth 2)");
    }
}
