//! Rewrites repository-relative links into absolute vendor URLs.

use anyhow::{Result, bail};
use lol_html::{RewriteStrSettings, element, rewrite_str};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// Where relative README references point to.
///
/// Built once per rendering and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRewriteContext {
    host: String,
    namespace: String,
    git_ref: String,
}

impl LinkRewriteContext {
    /// Creates context for `namespace` on `host` at `git_ref`.
    ///
    /// # Arguments
    ///
    /// * `host`: Base URL of the vendor, e.g. `https://gitlab.com`
    /// * `namespace`: Repository path within the host, e.g. `group/project`
    /// * `git_ref`: Branch, tag or commit the links resolve against
    pub fn new(
        host: impl Into<String>,
        namespace: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            namespace: namespace.into().trim_matches('/').to_string(),
            git_ref: git_ref.into().trim().to_string(),
        }
    }

    /// Vendor base URL without trailing slash.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Repository namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Reference links resolve against.
    pub fn git_ref(&self) -> &str {
        &self.git_ref
    }

    fn url(&self, kind: LinkKind, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.host,
            self.namespace,
            kind.segment(),
            self.git_ref,
            path
        )
    }
}

/// Attribute family being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// `<a href>`, pointing at the rendered file page.
    Hyperlink,
    /// `<img src>`, pointing at the raw file content.
    Image,
}

impl LinkKind {
    fn selector(self) -> &'static str {
        match self {
            Self::Hyperlink => "a[href]",
            Self::Image => "img[src]",
        }
    }

    fn attribute(self) -> &'static str {
        match self {
            Self::Hyperlink => "href",
            Self::Image => "src",
        }
    }

    fn segment(self) -> &'static str {
        match self {
            Self::Hyperlink => "blob",
            Self::Image => "raw",
        }
    }
}

/// Turns relative `href`/`src` values into absolute vendor URLs.
///
/// Relative targets are resolved against the directory of the rendered
/// document; a leading `/` anchors them at the repository root. Absolute URLs,
/// scheme links (`mailto:`), protocol-relative URLs and `#fragment` anchors
/// remain unchanged, which makes rewriting idempotent. Targets escaping the
/// repository root are left as written.
#[derive(Debug, Clone)]
pub struct LinkAbsolutizer<'a> {
    context: &'a LinkRewriteContext,
    base_dir: String,
}

impl<'a> LinkAbsolutizer<'a> {
    /// Creates absolutizer for a document at the repository root.
    pub fn new(context: &'a LinkRewriteContext) -> Self {
        Self {
            context,
            base_dir: String::new(),
        }
    }

    /// Creates absolutizer resolving against the directory of `document_path`.
    pub fn for_document(context: &'a LinkRewriteContext, document_path: &str) -> Self {
        let base_dir = match document_path.trim_start_matches('/').rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => String::new(),
        };
        Self { context, base_dir }
    }

    /// Resolves one attribute value.
    ///
    /// Returns `None` when the value must stay as written: absolute or scheme
    /// URLs, anchors, empty values and paths escaping the repository root.
    pub fn resolve(&self, target: &str, kind: LinkKind) -> Option<String> {
        let target = target.trim();

        if target.is_empty() || target.starts_with('#') || target.starts_with("//") {
            return None;
        }

        // Anything carrying a scheme is already absolute
        if Url::parse(target).is_ok() {
            return None;
        }

        let split = target
            .find(|c: char| c == '?' || c == '#')
            .unwrap_or(target.len());
        let (path, suffix) = target.split_at(split);
        if path.is_empty() {
            return None;
        }

        let joined = match path.strip_prefix('/') {
            Some(rooted) => rooted.to_string(),
            None if self.base_dir.is_empty() => path.to_string(),
            None => format!("{}/{}", self.base_dir, path),
        };

        match normalize_path(&joined) {
            Ok(normalized) if normalized.is_empty() => None,
            Ok(normalized) => Some(format!("{}{}", self.context.url(kind, &normalized), suffix)),
            Err(err) => {
                debug!(target, error = %err, "leaving link unrewritten");
                None
            }
        }
    }

    /// Rewrites hyperlinks, then image sources.
    pub fn absolutize(&self, html: &str) -> String {
        let html = self.absolutize_links(html);
        self.absolutize_images(&html)
    }

    /// Rewrites relative `<a href>` values to blob URLs.
    pub fn absolutize_links(&self, html: &str) -> String {
        self.rewrite(html, LinkKind::Hyperlink)
    }

    /// Rewrites relative `<img src>` values to raw URLs.
    pub fn absolutize_images(&self, html: &str) -> String {
        self.rewrite(html, LinkKind::Image)
    }

    /// Single pass over one attribute family.
    ///
    /// Each distinct target is resolved once and the result reused for every
    /// occurrence. A rewriter failure leaves the input unchanged.
    fn rewrite(&self, html: &str, kind: LinkKind) -> String {
        let attribute = kind.attribute();
        let mut resolved: HashMap<String, Option<String>> = HashMap::new();

        let result = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!(kind.selector(), |el| {
                    if let Some(value) = el.get_attribute(attribute) {
                        let rewritten = resolved
                            .entry(value.clone())
                            .or_insert_with(|| self.resolve(&value, kind))
                            .clone();
                        if let Some(url) = rewritten {
                            el.set_attribute(attribute, &url)?;
                        }
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::default()
            },
        );

        match result {
            Ok(rewritten) => rewritten,
            Err(err) => {
                warn!(?kind, error = %err, "link rewriting failed, keeping original HTML");
                html.to_string()
            }
        }
    }
}

/// Normalizes `/` separated path by resolving `..` and `.` segments.
///
/// # Errors
///
/// Returns error if path escapes repository root
fn normalize_path(path: &str) -> Result<String> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    bail!("Path escapes repository root: {path}");
                }
            }
            other => segments.push(other),
        }
    }

    Ok(segments.join("/"))
}
