//! Find, render, absolutize, sanitize.

use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use tracing::{debug, info};

use super::links::{LinkAbsolutizer, LinkRewriteContext};
use super::locator::{Probe, locate};
use super::renderer::{DocumentRenderer, RENDERED_TAGS, RendererOverrides};
use super::sanitize::SanitizationPolicy;
use super::{Candidate, default_candidates};
use crate::error::ConfigError;

/// Outcome of a README rendering.
///
/// A missing path with empty HTML means no candidate existed, which is a
/// normal result rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedDocument {
    path: Option<String>,
    html: String,
}

impl RenderedDocument {
    /// Document rendered from `path`.
    pub fn found(path: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            html: html.into(),
        }
    }

    /// Result when no candidate matched.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Repository path of the rendered README.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Sanitized HTML fragment.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn is_found(&self) -> bool {
        self.path.is_some()
    }

    pub fn into_parts(self) -> (Option<String>, String) {
        (self.path, self.html)
    }
}

impl Serialize for RenderedDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RenderedDocument", 3)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("found", &self.is_found())?;
        state.serialize_field("html", &self.html)?;
        state.end()
    }
}

/// Validated README configuration, reusable across repositories.
///
/// Holds no per-invocation state and can be shared between threads.
#[derive(Debug)]
pub struct ReadmePipeline {
    candidates: Vec<Candidate>,
    renderer: DocumentRenderer,
    policy: SanitizationPolicy,
}

impl ReadmePipeline {
    /// Creates pipeline from candidates, policy and renderer overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPolicyEntry`] if `policy` would strip a
    /// tag the built-in renderers emit.
    pub fn new(
        candidates: Vec<Candidate>,
        policy: SanitizationPolicy,
        overrides: RendererOverrides,
    ) -> Result<Self, ConfigError> {
        policy.ensure_covers(RENDERED_TAGS)?;

        Ok(Self {
            candidates,
            renderer: DocumentRenderer::with_overrides(overrides),
            policy,
        })
    }

    /// Candidates in probe order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn policy(&self) -> &SanitizationPolicy {
        &self.policy
    }

    /// Locates and renders the README reachable through `probe`.
    ///
    /// Relative links resolve against `context`, starting from the directory
    /// of the matched candidate. Sanitization always runs last.
    pub fn render<P>(&self, probe: &P, context: &LinkRewriteContext) -> RenderedDocument
    where
        P: Probe + ?Sized,
    {
        let Some(located) = locate(&self.candidates, probe) else {
            debug!(
                namespace = context.namespace(),
                candidates = self.candidates.len(),
                "no README candidate found"
            );
            return RenderedDocument::empty();
        };

        let path = located.candidate.path();
        let format = located.candidate.format();
        info!(path, %format, namespace = context.namespace(), "rendering README");

        let html = self.renderer.render(&located.text, format);

        let absolutizer = LinkAbsolutizer::for_document(context, path);
        let html = absolutizer.absolutize_links(&html);
        let html = absolutizer.absolutize_images(&html);

        let html = self.policy.sanitize(&html);

        RenderedDocument::found(path, html)
    }
}

impl Default for ReadmePipeline {
    /// Default candidates and allow-list, no overrides.
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            renderer: DocumentRenderer::new(),
            policy: SanitizationPolicy::default(),
        }
    }
}

/// One-shot README rendering.
///
/// # Errors
///
/// Returns [`ConfigError`] when `policy` does not cover the rendered tags.
pub fn render_readme<P>(
    probe: &P,
    candidates: &[Candidate],
    context: &LinkRewriteContext,
    policy: &SanitizationPolicy,
    overrides: RendererOverrides,
) -> Result<RenderedDocument, ConfigError>
where
    P: Probe + ?Sized,
{
    let pipeline = ReadmePipeline::new(candidates.to_vec(), policy.clone(), overrides)?;
    Ok(pipeline.render(probe, context))
}
