//! Route classification: which requests require a bearer token.
//!
//! # Responsibilities
//! - Hold the compiled (method, matcher, classification) table
//! - Classify a (method, path) pair as public, protected or unlisted
//!
//! # Design Decisions
//! - Public patterns are consulted before protected ones, so public wins on overlap
//! - First match wins within each list; table order is preserved from construction
//! - Unlisted is a distinct verdict but gates exactly like public
//! - Immutable after construction (thread-safe without locks)

use std::fmt;

use axum::http::Method;

use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// Authentication requirement for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Authentication optional; an invalid token is ignored.
    Public,
    /// A valid bearer token is mandatory.
    Protected,
    /// No pattern matched. Treated like `Public`.
    Unlisted,
}

impl Classification {
    /// Whether the gate must fail closed for this verdict.
    pub fn requires_token(self) -> bool {
        matches!(self, Classification::Protected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Public => "public",
            Classification::Protected => "protected",
            Classification::Unlisted => "unlisted",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single (method, path prefix) rule.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    method: Method,
    matcher: PathPrefixMatcher,
    classification: Classification,
}

impl RoutePattern {
    /// A pattern that makes authentication optional.
    pub fn public(method: Method, prefix: &str) -> Self {
        Self {
            method,
            matcher: PathPrefixMatcher::new(prefix),
            classification: Classification::Public,
        }
    }

    /// A pattern that makes authentication mandatory.
    pub fn protected(method: Method, prefix: &str) -> Self {
        Self {
            method,
            matcher: PathPrefixMatcher::new(prefix),
            classification: Classification::Protected,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == method && self.matcher.matches(path)
    }
}

/// The compiled classification table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    public: Vec<RoutePattern>,
    protected: Vec<RoutePattern>,
}

impl RouteTable {
    /// Compile a table from patterns, preserving their relative order.
    pub fn new(patterns: impl IntoIterator<Item = RoutePattern>) -> Self {
        let (public, protected) = patterns
            .into_iter()
            .partition(|p| p.classification == Classification::Public);
        Self { public, protected }
    }

    /// The gateway's routing policy.
    ///
    /// Reads are public, writes to content and commentary are protected, and
    /// registration/login are public so they can never be locked out.
    pub fn standard() -> Self {
        let mut patterns = vec![
            RoutePattern::public(Method::POST, "/auth/register"),
            RoutePattern::public(Method::POST, "/auth/login"),
            RoutePattern::public(Method::GET, "/posts"),
            RoutePattern::public(Method::GET, "/comments"),
        ];
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            patterns.push(RoutePattern::protected(method.clone(), "/posts"));
            patterns.push(RoutePattern::protected(method, "/comments"));
        }
        Self::new(patterns)
    }

    /// Classify a request. Total and side-effect free.
    pub fn classify(&self, method: &Method, path: &str) -> Classification {
        if self.public.iter().any(|p| p.matches(method, path)) {
            return Classification::Public;
        }
        if self.protected.iter().any(|p| p.matches(method, path)) {
            return Classification::Protected;
        }
        Classification::Unlisted
    }

    /// All patterns, public first.
    pub fn patterns(&self) -> impl Iterator<Item = &RoutePattern> {
        self.public.iter().chain(self.protected.iter())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}
