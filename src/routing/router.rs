//! Upstream lookup and path rewriting.
//!
//! # Responsibilities
//! - Store the three compiled upstream routes
//! - Look up the upstream for a request path
//! - Rewrite the inbound path into the upstream's namespace
//! - Return matched upstream or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest mount checked first, so nested mounts resolve deterministically
//! - Explicit NoMatch rather than silent default

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::uri::{Authority, Scheme};
use axum::http::Uri;
use url::{Position, Url};

use crate::config::{UpstreamConfig, UpstreamsConfig};
use crate::config::validation::ValidationError;
use crate::routing::matcher::{Matcher, MountMatcher};

/// Which backend service a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamKind {
    Identity,
    Content,
    Commentary,
}

impl UpstreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UpstreamKind::Identity => "identity",
            UpstreamKind::Content => "content",
            UpstreamKind::Commentary => "commentary",
        }
    }

    /// Whether the auth gate runs in front of this upstream.
    ///
    /// The identity service owns its own public/protected split.
    pub fn is_gated(self) -> bool {
        !matches!(self, UpstreamKind::Identity)
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled upstream route.
#[derive(Debug)]
pub struct Upstream {
    pub kind: UpstreamKind,
    mount: MountMatcher,
    rewrite_to: String,
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
}

impl Upstream {
    /// Compile an upstream from its configuration.
    pub fn from_config(kind: UpstreamKind, config: &UpstreamConfig) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::UpstreamUrl {
            upstream: kind.as_str(),
            url: config.base_url.clone(),
            reason,
        };

        let url = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        let scheme = Scheme::from_str(url.scheme()).map_err(|e| invalid(e.to_string()))?;
        let authority = Authority::from_str(&url[Position::BeforeHost..Position::AfterPort])
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            kind,
            mount: MountMatcher::new(config.mount.clone()),
            rewrite_to: config.rewrite_to.clone(),
            scheme,
            authority,
            base_path: url.path().trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            response_timeout: Duration::from_millis(config.response_timeout_ms),
        })
    }

    pub fn mount(&self) -> &str {
        self.mount.mount()
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn matches(&self, path: &str) -> bool {
        self.mount.matches(path)
    }

    /// Substitute the mount prefix with the rewrite target.
    pub fn rewrite_path(&self, path: &str) -> String {
        let rewritten = match path.strip_prefix(self.mount()) {
            Some(rest) => format!("{}{}", self.rewrite_to, rest),
            None => path.to_string(),
        };
        if rewritten.is_empty() {
            "/".to_string()
        } else {
            rewritten
        }
    }

    /// Absolute outbound URI for an inbound path and optional query.
    pub fn target_uri(&self, path: &str, query: Option<&str>) -> Result<Uri, axum::http::Error> {
        let mut path_and_query = format!("{}{}", self.base_path, self.rewrite_path(path));
        if let Some(query) = query {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

/// Maps inbound paths to upstreams.
#[derive(Debug)]
pub struct UpstreamRouter {
    upstreams: Vec<Arc<Upstream>>,
}

impl UpstreamRouter {
    /// Compile the identity, content and commentary routes.
    pub fn from_config(config: &UpstreamsConfig) -> Result<Self, ValidationError> {
        let mut upstreams = vec![
            Arc::new(Upstream::from_config(UpstreamKind::Identity, &config.identity)?),
            Arc::new(Upstream::from_config(UpstreamKind::Content, &config.content)?),
            Arc::new(Upstream::from_config(UpstreamKind::Commentary, &config.commentary)?),
        ];
        upstreams.sort_by(|a, b| b.mount().len().cmp(&a.mount().len()));

        Ok(Self { upstreams })
    }

    /// Look up the upstream owning `path`.
    pub fn match_path(&self, path: &str) -> Option<Arc<Upstream>> {
        self.upstreams.iter().find(|u| u.matches(path)).cloned()
    }

    pub fn get(&self, kind: UpstreamKind) -> Option<Arc<Upstream>> {
        self.upstreams.iter().find(|u| u.kind == kind).cloned()
    }

    pub fn upstreams(&self) -> &[Arc<Upstream>] {
        &self.upstreams
    }
}
