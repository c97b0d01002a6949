//! Path matching logic.
//!
//! # Responsibilities
//! - Match raw path prefixes (classification patterns)
//! - Match segment-aligned mounts (upstream dispatch)
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching
//! - Matchers are pure; they never see headers or bodies

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches any path that starts with the prefix, like an anchored `^/prefix` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches the mount itself or anything below it on a `/` boundary.
///
/// `/posts` matches `/posts`, `/posts/` and `/posts/5`, but not `/postscript`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountMatcher {
    mount: String,
}

impl MountMatcher {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
        }
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }
}

impl Matcher for MountMatcher {
    fn matches(&self, path: &str) -> bool {
        if self.mount == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(self.mount.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
