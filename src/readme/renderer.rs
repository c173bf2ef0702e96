//! Converts README sources into HTML.

use anyhow::{Context, Result};
use comrak::Options;
use maud::html;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::warn;

use super::DocumentFormat;
use super::rst;

/// Caller supplied conversion for one format.
///
/// An `Err` makes the renderer fall back to its built-in conversion.
pub type CustomRenderer = Arc<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Per-format custom renderers.
pub type RendererOverrides = HashMap<DocumentFormat, CustomRenderer>;

/// Every tag the built-in conversions can emit.
///
/// A sanitization policy used with [`DocumentRenderer`] must allow all of
/// these, otherwise rendered content would silently disappear.
pub const RENDERED_TAGS: &[&str] = &[
    "a",
    "blockquote",
    "br",
    "code",
    "dd",
    "del",
    "div",
    "dl",
    "dt",
    "em",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "img",
    "input",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "span",
    "strong",
    "sup",
    "table",
    "tbody",
    "td",
    "th",
    "thead",
    "tr",
    "ul",
];

/// Renders README text to HTML according to its declared format.
///
/// Markdown uses a fixed GitHub flavored profile: tables, task lists,
/// autolinks, strikethrough, footnotes, description lists and smart
/// punctuation. Fenced code with a known language is highlighted with
/// `hljs-` prefixed CSS classes. Raw HTML inside markdown passes through
/// untouched, so output must be sanitized before display.
///
/// Output depends only on `(text, format)`.
pub struct DocumentRenderer {
    syntax_set: SyntaxSet,
    overrides: RendererOverrides,
}

impl DocumentRenderer {
    /// Creates renderer using only the built-in conversions.
    pub fn new() -> Self {
        Self::with_overrides(RendererOverrides::new())
    }

    /// Creates renderer preferring `overrides` for the formats they cover.
    pub fn with_overrides(overrides: RendererOverrides) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            overrides,
        }
    }

    /// Renders `text` declared as `format`.
    ///
    /// A custom renderer registered for `format` is tried first. When it
    /// fails, the failure is logged and the built-in conversion is used.
    pub fn render(&self, text: &str, format: DocumentFormat) -> String {
        if let Some(custom) = self.overrides.get(&format) {
            match custom(text) {
                Ok(html) => return html,
                Err(err) => {
                    warn!(%format, error = %err, "custom renderer failed, using default");
                }
            }
        }

        self.render_default(text, format)
    }

    /// Renders with the built-in conversion, ignoring overrides.
    pub fn render_default(&self, text: &str, format: DocumentFormat) -> String {
        match format {
            DocumentFormat::Markdown => self.render_markdown(text),
            DocumentFormat::RestructuredText => rst::render(text),
            DocumentFormat::RawText => render_raw(text),
        }
    }

    /// Renders markdown with the fixed extension profile.
    pub fn render_markdown(&self, content: &str) -> String {
        let html = comrak::markdown_to_html(content, &markdown_options());

        match self.highlight_code_blocks(&html) {
            Ok(highlighted) => highlighted,
            Err(err) => {
                warn!(error = %err, "code highlighting failed, keeping plain code blocks");
                html
            }
        }
    }

    /// Post-processes HTML to apply syntax highlighting with CSS classes.
    ///
    /// Finds code blocks with language-* classes from comrak's output and
    /// replaces the plain text content with syntect highlighted HTML using
    /// CSS class names (hljs-* prefix).
    fn highlight_code_blocks(&self, html: &str) -> Result<String> {
        const OPEN: &str = "<code class=\"language-";
        const CLOSE: &str = "</code>";

        let mut result = String::with_capacity(html.len());
        let mut last_end = 0;
        let mut search_pos = 0;

        while let Some(found) = html[search_pos..].find(OPEN) {
            let code_start = search_pos + found;
            let lang_start = code_start + OPEN.len();

            let Some(lang_len) = html[lang_start..].find('"') else {
                search_pos = code_start + 1;
                continue;
            };
            let lang_end = lang_start + lang_len;
            let language = &html[lang_start..lang_end];

            let Some(tag_len) = html[lang_end..].find('>') else {
                search_pos = code_start + 1;
                continue;
            };
            let content_start = lang_end + tag_len + 1;

            let Some(content_len) = html[content_start..].find(CLOSE) else {
                search_pos = code_start + 1;
                continue;
            };
            let content_end = content_start + content_len;

            let code = html_decode(&html[content_start..content_end]);
            let highlighted = self
                .highlight_code(&code, language)
                .with_context(|| format!("Failed to highlight {language} code block"))?;

            result.push_str(&html[last_end..code_start]);
            result.push_str(OPEN);
            result.push_str(language);
            result.push_str("\">");
            result.push_str(&highlighted);
            result.push_str(CLOSE);

            last_end = content_end + CLOSE.len();
            search_pos = last_end;
        }

        result.push_str(&html[last_end..]);
        Ok(result)
    }

    /// Highlights code with syntect, unknown languages come back escaped.
    fn highlight_code(&self, code: &str, language: &str) -> Result<String> {
        if code.is_empty() {
            return Ok(String::new());
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(language)
            .or_else(|| self.syntax_set.find_syntax_by_extension(language));

        let Some(syntax) = syntax else {
            return Ok(escape(code));
        };

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntax_set,
            ClassStyle::SpacedPrefixed { prefix: "hljs-" },
        );

        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .context("Failed to parse line for syntax highlighting")?;
        }

        Ok(generator.finalize())
    }
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<_> = self.overrides.keys().collect();
        formats.sort();
        f.debug_struct("DocumentRenderer")
            .field("overrides", &formats)
            .finish_non_exhaustive()
    }
}

/// Markdown conversion profile.
fn markdown_options() -> Options<'static> {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.description_lists = true;

    options.parse.smart = true;

    // Sanitizer runs after rendering.
    options.render.unsafe_ = true;

    options
}

/// Plain text: each newline becomes `<br>`, text is escaped.
pub fn render_raw(text: &str) -> String {
    html! {
        @for (idx, line) in text.split('\n').enumerate() {
            @if idx > 0 {
                br;
            }
            (line.strip_suffix('\r').unwrap_or(line))
        }
    }
    .into_string()
}

/// Escapes HTML special characters.
pub(crate) fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// Reverses the escaping comrak applies inside code blocks.
fn html_decode(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
