//! Settings file (`forgeview.toml`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::readme::{Candidate, CandidateSpec, default_candidates, parse_candidates};
use crate::vendor::{ClientOptions, VendorKind};

/// Default number of commits and tags in listings.
pub const DEFAULT_LISTING_LIMIT: usize = 10;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User facing settings.
///
/// Every field is optional in the file; missing ones take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// API token passed through to the vendor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Reference README links resolve against, instead of the default branch.
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    /// Accept plain HTTP repository URLs.
    pub allow_insecure: bool,

    pub timeout_secs: u64,

    pub limits: Limits,

    pub api: ApiOverrides,

    pub readme: ReadmeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: None,
            git_ref: None,
            allow_insecure: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            limits: Limits::default(),
            api: ApiOverrides::default(),
            readme: ReadmeSettings::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    pub latest_commits: usize,
    pub latest_tags: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            latest_commits: DEFAULT_LISTING_LIMIT,
            latest_tags: DEFAULT_LISTING_LIMIT,
        }
    }
}

/// API base URLs replacing the ones derived from the repository host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitlab: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadmeSettings {
    /// Probe order; the built-in list when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<CandidateSpec>>,
}

impl Settings {
    /// Parses and validates TOML settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] for malformed TOML or invalid
    /// values, and candidate errors for bad README entries.
    pub fn parse_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(input).map_err(|err| ConfigError::Settings(err.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let input = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::parse_toml(&input)
            .with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    /// Checks values that serde alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Settings(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        if let Some(git_ref) = &self.git_ref
            && git_ref.trim().is_empty()
        {
            return Err(ConfigError::Settings("ref must not be empty".to_string()));
        }

        self.candidates().map(|_| ())
    }

    /// README candidates in probe order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unknown formats or empty paths.
    pub fn candidates(&self) -> Result<Vec<Candidate>, ConfigError> {
        match &self.readme.candidates {
            Some(specs) => parse_candidates(specs),
            None => Ok(default_candidates()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connection options for `kind`.
    pub fn client_options(&self, kind: VendorKind) -> ClientOptions {
        let api_base = match kind {
            VendorKind::GitHub => self.api.github.clone(),
            VendorKind::GitLab => self.api.gitlab.clone(),
        };

        ClientOptions {
            token: self.token.clone(),
            api_base,
            timeout: self.timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readme::DocumentFormat;

    #[test]
    fn test_empty_input_uses_defaults() {
        // Act
        let settings = Settings::parse_toml("").expect("Should parse empty settings");

        // Assert
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.limits.latest_commits, 10);
        assert_eq!(settings.limits.latest_tags, 10);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert_eq!(settings.candidates().expect("defaults").len(), 12);
    }

    #[test]
    fn test_full_settings() {
        // Arrange
        let input = r#"
            token = "secret"
            ref = "develop"
            allow_insecure = true
            timeout_secs = 5

            [limits]
            latest_commits = 3

            [api]
            gitlab = "https://gitlab.internal/api/v4"

            [[readme.candidates]]
            path = "docs/index.rst"
            format = "rst"

            [[readme.candidates]]
            path = "README"
            format = "txt"
        "#;

        // Act
        let settings = Settings::parse_toml(input).expect("Should parse settings");

        // Assert
        assert_eq!(settings.git_ref.as_deref(), Some("develop"));
        assert!(settings.allow_insecure);
        assert_eq!(settings.limits.latest_commits, 3);
        assert_eq!(settings.limits.latest_tags, 10);

        let candidates = settings.candidates().expect("Should parse candidates");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].path(), "docs/index.rst");
        assert_eq!(candidates[0].format(), DocumentFormat::RestructuredText);
        assert_eq!(candidates[1].format(), DocumentFormat::RawText);

        let options = settings.client_options(VendorKind::GitLab);
        assert_eq!(options.token.as_deref(), Some("secret"));
        assert_eq!(options.api_base.as_deref(), Some("https://gitlab.internal/api/v4"));
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(settings.client_options(VendorKind::GitHub).api_base, None);
    }

    #[test]
    fn test_unknown_candidate_format_rejected() {
        // Arrange
        let input = r#"
            [[readme.candidates]]
            path = "README.adoc"
            format = "asciidoc"
        "#;

        // Act
        let result = Settings::parse_toml(input);

        // Assert
        assert!(matches!(result, Err(ConfigError::UnknownFormat { .. })));
    }

    #[test]
    fn test_unknown_field_rejected() {
        // Act
        let result = Settings::parse_toml("colour = \"blue\"");

        // Assert
        assert!(matches!(result, Err(ConfigError::Settings(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        // Act
        let result = Settings::parse_toml("timeout_secs = 0");

        // Assert
        assert!(matches!(result, Err(ConfigError::Settings(_))));
    }

    #[test]
    fn test_explicit_empty_candidate_list_kept() {
        // Arrange
        let input = "[readme]\ncandidates = []\n";

        // Act
        let settings = Settings::parse_toml(input).expect("Should parse");

        // Assert
        assert!(settings.candidates().expect("Should parse").is_empty());
    }
}
