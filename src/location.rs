//! Repository URL parsing.

use serde::Serialize;
use std::fmt;
use url::Url;

use crate::error::ConfigError;

/// Host and namespace of a hosted repository.
///
/// Parsed from URLs such as `https://gitlab.com/group/sub/project.git`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoLocation {
    host: String,
    namespace: String,
}

impl RepoLocation {
    /// Parses a repository web URL.
    ///
    /// A trailing slash and `.git` suffix are ignored. Plain HTTP is rejected
    /// unless `allow_insecure` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InsecureUrl`] for HTTP URLs when not allowed, or
    /// [`ConfigError::InvalidUrl`] if the URL cannot be parsed or lacks a
    /// namespace.
    pub fn parse(url: &str, allow_insecure: bool) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(url.trim()).map_err(|err| invalid(&err.to_string()))?;

        match parsed.scheme() {
            "https" => {}
            "http" if allow_insecure => {}
            "http" => return Err(ConfigError::InsecureUrl(url.to_string())),
            other => return Err(invalid(&format!("unsupported scheme '{other}'"))),
        }

        if parsed.host_str().is_none() {
            return Err(invalid("missing host"));
        }

        let path = parsed.path().trim_matches('/');
        let namespace = path.strip_suffix(".git").unwrap_or(path);
        if !namespace.contains('/') || namespace.split('/').any(str::is_empty) {
            return Err(invalid("expected owner/project path"));
        }

        Ok(Self {
            host: parsed.origin().ascii_serialization(),
            namespace: namespace.to_string(),
        })
    }

    /// Builds location from already validated parts.
    pub fn new(host: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            namespace: namespace.into().trim_matches('/').to_string(),
        }
    }

    /// Scheme, host and port, e.g. `https://github.com`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Domain name without scheme or port.
    pub fn host_name(&self) -> &str {
        let without_scheme = self
            .host
            .split_once("://")
            .map_or(self.host.as_str(), |(_, rest)| rest);
        without_scheme
            .split(':')
            .next()
            .unwrap_or(without_scheme)
    }

    /// Repository path, e.g. `group/sub/project`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Last namespace segment.
    pub fn project(&self) -> &str {
        self.namespace
            .rsplit('/')
            .next()
            .unwrap_or(&self.namespace)
    }

    /// Web URL of the repository.
    pub fn web_url(&self) -> String {
        format!("{}/{}", self.host, self.namespace)
    }
}

impl fmt::Display for RepoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_url() {
        // Act
        let location = RepoLocation::parse("https://gitlab.com/group/sub/project.git/", false)
            .expect("Should parse");

        // Assert
        assert_eq!(location.host(), "https://gitlab.com");
        assert_eq!(location.host_name(), "gitlab.com");
        assert_eq!(location.namespace(), "group/sub/project");
        assert_eq!(location.project(), "project");
    }

    #[test]
    fn test_parse_keeps_custom_port() {
        // Act
        let location = RepoLocation::parse("https://git.example.org:8443/team/app", false)
            .expect("Should parse");

        // Assert
        assert_eq!(location.host(), "https://git.example.org:8443");
        assert_eq!(location.host_name(), "git.example.org");
        assert_eq!(location.web_url(), "https://git.example.org:8443/team/app");
    }

    #[test]
    fn test_http_rejected_unless_allowed() {
        // Act
        let strict = RepoLocation::parse("http://localhost/team/app", false);
        let relaxed = RepoLocation::parse("http://localhost/team/app", true);

        // Assert
        assert_eq!(
            strict,
            Err(ConfigError::InsecureUrl("http://localhost/team/app".to_string()))
        );
        assert!(relaxed.is_ok());
    }

    #[test]
    fn test_missing_namespace_rejected() {
        // Act
        let result = RepoLocation::parse("https://github.com/acme", false);

        // Assert
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_ssh_scheme_rejected() {
        // Act
        let result = RepoLocation::parse("ssh://git@github.com/acme/widgets", true);

        // Assert
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }
}
