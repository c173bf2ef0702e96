//! README candidates: (path, format) pairs probed in order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Source format a README candidate is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Markdown,
    RestructuredText,
    RawText,
}

impl DocumentFormat {
    /// Short identifier used in settings files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::RestructuredText => "rst",
            Self::RawText => "raw",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "rst" | "restructuredtext" => Ok(Self::RestructuredText),
            "raw" | "txt" | "text" => Ok(Self::RawText),
            other => Err(other.to_string()),
        }
    }
}

/// A path probed for README existence, with the format used to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    path: String,
    format: DocumentFormat,
}

impl Candidate {
    /// Creates candidate from a path and an already typed format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCandidatePath`] for blank paths.
    pub fn new(path: impl Into<String>, format: DocumentFormat) -> Result<Self, ConfigError> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(ConfigError::EmptyCandidatePath);
        }
        Ok(Self { path, format })
    }

    /// Creates candidate from textual settings such as `("README.rst", "rst")`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownFormat`] when the format identifier is not
    /// recognized, or [`ConfigError::EmptyCandidatePath`] for blank paths.
    pub fn parse(path: &str, format: &str) -> Result<Self, ConfigError> {
        let format = format
            .parse::<DocumentFormat>()
            .map_err(|format| ConfigError::UnknownFormat {
                path: path.to_string(),
                format,
            })?;
        Self::new(path, format)
    }

    /// Path relative to repository root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared format.
    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

/// Textual candidate entry as written in settings files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub path: String,
    pub format: String,
}

impl CandidateSpec {
    /// Validates the entry into a typed [`Candidate`].
    ///
    /// # Errors
    ///
    /// See [`Candidate::parse`].
    pub fn to_candidate(&self) -> Result<Candidate, ConfigError> {
        Candidate::parse(&self.path, &self.format)
    }
}

/// Parses a whole candidate list, failing on the first invalid entry.
///
/// # Errors
///
/// See [`Candidate::parse`].
pub fn parse_candidates(specs: &[CandidateSpec]) -> Result<Vec<Candidate>, ConfigError> {
    specs.iter().map(CandidateSpec::to_candidate).collect()
}

/// Default probe order: README, ReadMe and readme, each as .md, .rst, bare and .txt.
pub fn default_candidates() -> Vec<Candidate> {
    const STEMS: [&str; 3] = ["README", "ReadMe", "readme"];
    const SUFFIXES: [(&str, DocumentFormat); 4] = [
        (".md", DocumentFormat::Markdown),
        (".rst", DocumentFormat::RestructuredText),
        ("", DocumentFormat::RawText),
        (".txt", DocumentFormat::RawText),
    ];

    STEMS
        .iter()
        .flat_map(|stem| {
            SUFFIXES.iter().map(move |(suffix, format)| Candidate {
                path: format!("{stem}{suffix}"),
                format: *format,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_aliases() {
        // Arrange
        let inputs = [
            ("md", DocumentFormat::Markdown),
            ("Markdown", DocumentFormat::Markdown),
            ("rst", DocumentFormat::RestructuredText),
            ("raw", DocumentFormat::RawText),
            ("txt", DocumentFormat::RawText),
        ];

        // Act & Assert
        for (text, expected) in inputs {
            assert_eq!(text.parse::<DocumentFormat>(), Ok(expected), "{text}");
        }
    }

    #[test]
    fn test_parse_candidate_unknown_format_rejected() {
        // Act
        let result = Candidate::parse("README.adoc", "asciidoc");

        // Assert
        assert_eq!(
            result,
            Err(ConfigError::UnknownFormat {
                path: "README.adoc".to_string(),
                format: "asciidoc".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_path_rejected() {
        // Act
        let result = Candidate::new("  ", DocumentFormat::Markdown);

        // Assert
        assert_eq!(result, Err(ConfigError::EmptyCandidatePath));
    }

    #[test]
    fn test_default_candidates_order() {
        // Act
        let candidates = default_candidates();

        // Assert
        assert_eq!(candidates.len(), 12);
        assert_eq!(candidates[0].path(), "README.md");
        assert_eq!(candidates[0].format(), DocumentFormat::Markdown);
        assert_eq!(candidates[1].path(), "README.rst");
        assert_eq!(candidates[2].path(), "README");
        assert_eq!(candidates[2].format(), DocumentFormat::RawText);
        assert_eq!(candidates[3].path(), "README.txt");
        assert_eq!(candidates[4].path(), "ReadMe.md");
        assert_eq!(candidates[11].path(), "readme.txt");
    }

    #[test]
    fn test_parse_candidates_stops_on_invalid_entry() {
        // Arrange
        let specs = vec![
            CandidateSpec {
                path: "README.md".to_string(),
                format: "md".to_string(),
            },
            CandidateSpec {
                path: "README.org".to_string(),
                format: "org".to_string(),
            },
        ];

        // Act
        let result = parse_candidates(&specs);

        // Assert
        assert!(matches!(result, Err(ConfigError::UnknownFormat { .. })));
    }
}
