//! README discovery and rendering.

mod candidate;
mod links;
mod locator;
mod pipeline;
mod renderer;
mod rst;
mod sanitize;

pub use candidate::{
    Candidate, CandidateSpec, DocumentFormat, default_candidates, parse_candidates,
};
pub use links::{LinkAbsolutizer, LinkKind, LinkRewriteContext};
pub use locator::{Located, Probe, locate};
pub use pipeline::{ReadmePipeline, RenderedDocument, render_readme};
pub use renderer::{CustomRenderer, DocumentRenderer, RENDERED_TAGS, RendererOverrides, render_raw};
pub use sanitize::{GLOBAL, SanitizationPolicy};

/// Renders reStructuredText into an HTML body fragment.
pub fn render_rst(source: &str) -> String {
    rst::render(source)
}
