//! Hosted repository vendors behind one interface.

mod github;
mod gitlab;
mod model;
mod transport;

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::location::RepoLocation;
use crate::readme::LinkRewriteContext;

pub use github::GitHubClient;
pub use gitlab::GitLabClient;
pub use model::{
    CommitRecord, ContributorRecord, LanguageShares, MemberExtra, MemberRecord, Summary,
    TagRecord, percentages_from_bytes, round_percentages,
};
pub use transport::{HttpTransport, Transport};

#[cfg(test)]
pub use transport::MockTransport;

/// Supported vendors, selected by short identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorKind {
    GitHub,
    GitLab,
}

impl VendorKind {
    pub const ALL: [VendorKind; 2] = [VendorKind::GitHub, VendorKind::GitLab];

    /// Identifier used in settings and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
        }
    }

    /// Human readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
        }
    }

    /// Infers the vendor from a well-known public host.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownHost`] for self-hosted instances, which
    /// need an explicit vendor.
    pub fn from_host(host: &str) -> Result<Self, ConfigError> {
        let host = host.trim().to_ascii_lowercase();
        match host.strip_prefix("www.").unwrap_or(&host) {
            "github.com" => Ok(Self::GitHub),
            "gitlab.com" => Ok(Self::GitLab),
            _ => Err(ConfigError::UnknownHost(host.clone())),
        }
    }
}

impl fmt::Display for VendorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for VendorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid_id(s) {
            return Err(ConfigError::MalformedVendorId(s.to_string()));
        }

        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| ConfigError::UnsupportedVendor(s.to_string()))
    }
}

/// Vendor ids are lower-case ASCII: a letter, then letters, digits or `_`.
fn is_valid_id(id: &str) -> bool {
    let mut chars = id.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Operations every vendor provides, normalized into common records.
pub trait VendorClient: Send + Sync {
    fn kind(&self) -> VendorKind;

    fn location(&self) -> &RepoLocation;

    /// Default branch name of the repository.
    fn default_branch(&self) -> Result<String>;

    /// Raw text of `path` at `git_ref`.
    fn read_file(&self, path: &str, git_ref: &str) -> Result<String>;

    fn latest_commits(&self, limit: usize) -> Result<Vec<CommitRecord>>;

    fn latest_tags(&self, limit: usize) -> Result<Vec<TagRecord>>;

    /// Commit authors with per-author counters.
    fn commits_contributors(&self) -> Result<Vec<ContributorRecord>>;

    /// Distinct issue authors, in first-seen order.
    fn issues_contributors(&self) -> Result<Vec<ContributorRecord>>;

    fn members(&self) -> Result<Vec<MemberRecord>>;

    fn languages(&self) -> Result<LanguageShares>;

    /// Download URL of a source archive.
    fn archive_url(&self, extension: &str, git_ref: &str) -> String;

    /// Context for absolutizing README links at `git_ref`.
    fn link_context(&self, git_ref: &str) -> LinkRewriteContext {
        let location = self.location();
        LinkRewriteContext::new(location.host(), location.namespace(), git_ref)
    }
}

/// Connection parameters shared by all vendors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub token: Option<String>,
    pub api_base: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            token: None,
            api_base: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Creates an HTTP backed client for `kind`.
///
/// # Errors
///
/// Returns error if the HTTP client cannot be built.
pub fn connect(
    kind: VendorKind,
    location: RepoLocation,
    options: &ClientOptions,
) -> Result<Box<dyn VendorClient>> {
    let client: Box<dyn VendorClient> = match kind {
        VendorKind::GitHub => Box::new(GitHubClient::connect(location, options)?),
        VendorKind::GitLab => Box::new(GitLabClient::connect(location, options)?),
    };
    Ok(client)
}
