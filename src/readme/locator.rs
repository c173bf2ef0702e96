//! Sequential README discovery.

use anyhow::Result;
use tracing::debug;

use super::Candidate;

/// Fetches raw document text for a repository path.
///
/// Any error means "not usable here": missing file, network failure and
/// permission problems are all treated the same by the locator.
pub trait Probe {
    fn probe(&self, path: &str) -> Result<String>;
}

impl<F> Probe for F
where
    F: Fn(&str) -> Result<String>,
{
    fn probe(&self, path: &str) -> Result<String> {
        self(path)
    }
}

/// Candidate that matched, with the text the probe returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<'c> {
    pub candidate: &'c Candidate,
    pub text: String,
}

/// Returns the first candidate whose probe succeeds.
///
/// Probes run one at a time in the given order and stop at the first success,
/// so later candidates are never fetched speculatively. Failures are not
/// retried. An empty candidate list returns `None` without probing.
pub fn locate<'c, P>(candidates: &'c [Candidate], probe: &P) -> Option<Located<'c>>
where
    P: Probe + ?Sized,
{
    for candidate in candidates {
        match probe.probe(candidate.path()) {
            Ok(text) => {
                debug!(path = candidate.path(), format = %candidate.format(), "README candidate matched");
                return Some(Located { candidate, text });
            }
            Err(err) => {
                debug!(path = candidate.path(), error = %err, "README candidate unavailable");
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readme::DocumentFormat;
    use anyhow::bail;
    use std::cell::RefCell;

    fn candidates(paths: &[&str]) -> Vec<Candidate> {
        paths
            .iter()
            .map(|p| Candidate::new(*p, DocumentFormat::Markdown).expect("valid candidate"))
            .collect()
    }

    #[test]
    fn test_locate_returns_first_success() {
        // Arrange
        let list = candidates(&["README.md", "README.rst", "README"]);
        let calls = RefCell::new(Vec::new());
        let probe = |path: &str| -> Result<String> {
            calls.borrow_mut().push(path.to_string());
            if path == "README.rst" {
                Ok("body".to_string())
            } else {
                bail!("404")
            }
        };

        // Act
        let located = locate(&list, &probe).expect("Should locate README.rst");

        // Assert
        assert_eq!(located.candidate.path(), "README.rst");
        assert_eq!(located.text, "body");
        assert_eq!(*calls.borrow(), vec!["README.md", "README.rst"]);
    }

    #[test]
    fn test_locate_none_probes_each_once() {
        // Arrange
        let list = candidates(&["a", "b", "c"]);
        let calls = RefCell::new(Vec::new());
        let probe = |path: &str| -> Result<String> {
            calls.borrow_mut().push(path.to_string());
            bail!("missing")
        };

        // Act
        let located = locate(&list, &probe);

        // Assert
        assert!(located.is_none());
        assert_eq!(*calls.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_locate_empty_list_never_probes() {
        // Arrange
        let calls = RefCell::new(0usize);
        let probe = |_: &str| -> Result<String> {
            *calls.borrow_mut() += 1;
            Ok(String::new())
        };

        // Act
        let located = locate(&[], &probe);

        // Assert
        assert!(located.is_none());
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_locate_accepts_empty_document() {
        // Arrange
        let list = candidates(&["README.md"]);
        let probe = |_: &str| -> Result<String> { Ok(String::new()) };

        // Act
        let located = locate(&list, &probe);

        // Assert
        assert_eq!(located.map(|l| l.text), Some(String::new()));
    }
}
