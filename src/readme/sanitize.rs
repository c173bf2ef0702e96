//! Allow-list HTML sanitization.

use ammonia::Builder;
use lol_html::errors::RewritingError;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::warn;

use crate::error::ConfigError;

/// Policy key holding attributes allowed on every tag.
pub const GLOBAL: &str = "*";

/// Raw text elements ammonia empties on its own when they are not allowed.
const RAW_TEXT: &[&str] = &["script", "style"];

const URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

const LINK_REL: &str = "noopener noreferrer";

/// Tags and attributes allowed to survive sanitization.
///
/// The [`GLOBAL`] entry lists attributes accepted on every allowed tag. The
/// policy is immutable once built and shared freely between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationPolicy {
    allowed: BTreeMap<String, BTreeSet<String>>,
}

impl SanitizationPolicy {
    /// Creates a policy allowing nothing.
    pub fn empty() -> Self {
        Self {
            allowed: BTreeMap::new(),
        }
    }

    /// Allows `tag` with the given attributes, merging with earlier entries.
    pub fn allow(mut self, tag: &str, attributes: &[&str]) -> Self {
        let entry = self.allowed.entry(tag.to_ascii_lowercase()).or_default();
        entry.extend(attributes.iter().map(|a| a.to_ascii_lowercase()));
        self
    }

    /// Allows attributes on every permitted tag.
    pub fn allow_global(self, attributes: &[&str]) -> Self {
        self.allow(GLOBAL, attributes)
    }

    /// Whether `tag` survives sanitization.
    pub fn allows_tag(&self, tag: &str) -> bool {
        tag != GLOBAL && self.allowed.contains_key(&tag.to_ascii_lowercase())
    }

    /// Whether `attribute` survives on `tag`, directly or through [`GLOBAL`].
    pub fn allows_attribute(&self, tag: &str, attribute: &str) -> bool {
        let attribute = attribute.to_ascii_lowercase();
        let on = |key: &str| {
            self.allowed
                .get(key)
                .is_some_and(|attrs| attrs.contains(&attribute))
        };
        self.allows_tag(tag) && (on(&tag.to_ascii_lowercase()) || on(GLOBAL))
    }

    /// Allowed tag names, excluding the global entry.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.allowed
            .keys()
            .map(String::as_str)
            .filter(|tag| *tag != GLOBAL)
    }

    /// Checks that every tag in `required` is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPolicyEntry`] naming the first missing tag.
    pub fn ensure_covers(&self, required: &[&str]) -> Result<(), ConfigError> {
        match required.iter().find(|tag| !self.allows_tag(tag)) {
            Some(tag) => Err(ConfigError::MissingPolicyEntry {
                tag: tag.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Filters `html` down to the allowed tags and attributes.
    ///
    /// Every element missing from the policy is dropped together with its
    /// content, whatever its name; children are never hoisted into the
    /// parent. Comments are removed. URL attributes keep only http, https and
    /// mailto schemes or relative values. Malformed fragments never fail:
    /// markup the element pass cannot parse unambiguously is withheld
    /// entirely.
    pub fn sanitize(&self, html: &str) -> String {
        let stripped = match self.strip_disallowed(html) {
            Ok(stripped) => stripped,
            Err(err) => {
                warn!(error = %err, "HTML could not be filtered, dropping fragment");
                return String::new();
            }
        };

        self.builder().clean(&stripped).to_string()
    }

    /// Removes disallowed elements and everything inside them.
    fn strip_disallowed(&self, html: &str) -> Result<String, RewritingError> {
        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!("*", |el| {
                    if !self.allows_tag(&el.tag_name()) {
                        el.remove();
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::default()
            },
        )
    }

    fn builder(&self) -> Builder<'_> {
        let tags: HashSet<&str> = self.tags().collect();

        let generic: HashSet<&str> = self
            .allowed
            .get(GLOBAL)
            .map(|attrs| attrs.iter().map(String::as_str).collect())
            .unwrap_or_default();

        let per_tag: HashMap<&str, HashSet<&str>> = self
            .allowed
            .iter()
            .filter(|(tag, _)| tag.as_str() != GLOBAL)
            .map(|(tag, attrs)| (tag.as_str(), attrs.iter().map(String::as_str).collect()))
            .collect();

        // ammonia rejects tags that are both kept and emptied
        let emptied: HashSet<&str> = RAW_TEXT
            .iter()
            .copied()
            .filter(|tag| !tags.contains(tag))
            .collect();

        let keeps_rel = generic.contains("rel")
            || per_tag.get("a").is_some_and(|attrs| attrs.contains("rel"));

        let mut builder = Builder::default();
        builder
            .tags(tags)
            .generic_attributes(generic)
            .tag_attributes(per_tag)
            .clean_content_tags(emptied)
            .url_schemes(URL_SCHEMES.iter().copied().collect())
            .strip_comments(true)
            .link_rel(if keeps_rel { None } else { Some(LINK_REL) });
        builder
    }
}

impl Default for SanitizationPolicy {
    /// Allow-list covering everything the built-in renderers emit, plus the
    /// inline HTML READMEs commonly carry.
    fn default() -> Self {
        let plain = [
            "abbr", "b", "blockquote", "br", "code", "dd", "del", "dl", "dt", "em", "h1", "h2",
            "h3", "h4", "h5", "h6", "hr", "i", "ins", "kbd", "li", "mark", "p", "picture", "pre",
            "s", "section", "small", "span", "strong", "sub", "summary", "sup", "tbody", "thead",
            "tr", "u", "ul", "table",
        ];

        let policy = plain
            .iter()
            .fold(Self::empty(), |policy, tag| policy.allow(tag, &[]));

        policy
            .allow("a", &["href", "title"])
            .allow("img", &["src", "alt", "title", "width", "height", "align"])
            .allow("input", &["type", "checked", "disabled"])
            .allow("ol", &["start"])
            .allow("th", &["align"])
            .allow("td", &["align"])
            .allow("p", &["align"])
            .allow("div", &["align"])
            .allow("details", &["open"])
            .allow("source", &["srcset", "media", "type", "width", "height"])
            .allow_global(&[
                "id",
                "class",
                "title",
                "lang",
                "dir",
                "aria-label",
                "aria-hidden",
                "data-footnotes",
                "data-footnote-ref",
                "data-footnote-backref",
                "data-footnote-backref-idx",
            ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readme::RENDERED_TAGS;

    #[test]
    fn test_script_removed_with_content() {
        // Arrange
        let policy = SanitizationPolicy::default();

        // Act
        let result = policy.sanitize("<script>alert(1)</script><p>ok</p>");

        // Assert
        assert_eq!(result, "<p>ok</p>");
    }

    #[test]
    fn test_allowed_input_unchanged() {
        // Arrange
        let policy = SanitizationPolicy::default();
        let html = "<h1>Title</h1>\n<p>Some <strong>bold</strong> and <code>x &lt; y</code>.</p>\n<ul>\n<li>one</li>\n</ul>\n<a href=\"https://example.com\" rel=\"noopener noreferrer\">x</a>";

        // Act
        let result = policy.sanitize(html);

        // Assert
        assert_eq!(result, html);
    }

    #[test]
    fn test_disallowed_attributes_stripped() {
        // Arrange
        let policy = SanitizationPolicy::default();

        // Act
        let result = policy.sanitize(r#"<p onclick="steal()" class="lead" style="color:red">x</p>"#);

        // Assert
        assert_eq!(result, r#"<p class="lead">x</p>"#);
    }

    #[test]
    fn test_javascript_url_dropped() {
        // Arrange
        let policy = SanitizationPolicy::default();

        // Act
        let result = policy.sanitize(r#"<a href="javascript:alert(1)">x</a>"#);

        // Assert
        assert!(!result.contains("javascript"), "{result}");
        assert!(result.contains(">x</a>"), "{result}");
    }

    #[test]
    fn test_unallowed_known_tag_removed_with_content() {
        // Arrange
        let policy = SanitizationPolicy::empty().allow("p", &[]);

        // Act
        let result = policy.sanitize("<table><tr><td>cell</td></tr></table><p>after</p>");

        // Assert
        assert_eq!(result, "<p>after</p>");
    }

    #[test]
    fn test_unknown_element_removed_with_content() {
        // Arrange
        let policy = SanitizationPolicy::default();

        // Act
        let custom = policy.sanitize("<p><custom-widget>inner</custom-widget>kept</p>");
        let legacy = policy.sanitize("<p><big>big</big><acronym>ac</acronym><blink>bl</blink><nobr>nob</nobr></p>");

        // Assert
        assert_eq!(custom, "<p>kept</p>");
        assert_eq!(legacy, "<p></p>");
    }

    #[test]
    fn test_nested_children_not_hoisted() {
        // Arrange
        let policy = SanitizationPolicy::empty().allow("p", &[]).allow("em", &[]);

        // Act
        let result = policy.sanitize("<p>a<span>b<em>c</em></span>d</p>");

        // Assert
        assert_eq!(result, "<p>ad</p>");
    }

    #[test]
    fn test_common_readme_markup_kept() {
        // Arrange
        let policy = SanitizationPolicy::default();
        let html = "<p align=\"center\"><b>bold</b> <i>it</i> <u>u</u> <small>s</small> <mark>m</mark></p><details open=\"\"><summary>More</summary><p>body</p></details>";

        // Act
        let result = policy.sanitize(html);

        // Assert
        assert_eq!(result, html);
    }

    #[test]
    fn test_malformed_fragments_tolerated() {
        // Arrange
        let policy = SanitizationPolicy::default();
        let inputs = [
            "<p><a href=\"x\">unclosed <div",
            "</p>stray<td>",
            "<p>open <strong>bold",
            "<<>>&&<p",
            "<ul><li>one<li>two",
        ];

        for input in inputs {
            // Act
            let first = policy.sanitize(input);
            let second = policy.sanitize(input);
            let again = policy.sanitize(&first);

            // Assert
            assert_eq!(first, second, "Output should be deterministic for {input:?}");
            assert_eq!(again, first, "Output should be stable HTML for {input:?}");
            for tag in ["p", "a", "strong", "ul", "li"] {
                assert_eq!(
                    first.matches(&format!("<{tag}>")).count() + first.matches(&format!("<{tag} ")).count(),
                    first.matches(&format!("</{tag}>")).count(),
                    "Unbalanced <{tag}> in {first:?}"
                );
            }
        }
    }

    #[test]
    fn test_comments_stripped() {
        // Arrange
        let policy = SanitizationPolicy::default();

        // Act
        let result = policy.sanitize("<p>a<!-- hidden -->b</p>");

        // Assert
        assert_eq!(result, "<p>ab</p>");
    }

    #[test]
    fn test_rel_kept_when_allowed() {
        // Arrange
        let policy = SanitizationPolicy::default().allow("a", &["rel"]);

        // Act
        let result = policy.sanitize(r#"<a href="/x" rel="me">x</a>"#);

        // Assert
        assert_eq!(result, r#"<a href="/x" rel="me">x</a>"#);
    }

    #[test]
    fn test_global_attribute_lookup() {
        // Arrange
        let policy = SanitizationPolicy::default();

        // Act & Assert
        assert!(policy.allows_attribute("span", "class"));
        assert!(policy.allows_attribute("a", "href"));
        assert!(!policy.allows_attribute("p", "href"));
        assert!(!policy.allows_tag(GLOBAL));
    }

    #[test]
    fn test_default_policy_covers_renderer() {
        // Act
        let result = SanitizationPolicy::default().ensure_covers(RENDERED_TAGS);

        // Assert
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_missing_tag_reported() {
        // Arrange
        let policy = SanitizationPolicy::empty().allow("p", &[]);

        // Act
        let result = policy.ensure_covers(&["p", "h1", "table"]);

        // Assert
        assert_eq!(
            result,
            Err(ConfigError::MissingPolicyEntry {
                tag: "h1".to_string()
            })
        );
    }
}
