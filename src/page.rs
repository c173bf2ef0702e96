//! Standalone HTML overview page.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::location::RepoLocation;
use crate::readme::RenderedDocument;
use crate::vendor::{CommitRecord, Summary, TagRecord, VendorKind};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#f6f8fa;color:#1f2328}\
.container{max-width:980px;margin:0 auto;padding:24px}\
.repo-card{background:#fff;border:1px solid #d0d7de;border-radius:6px;padding:16px 24px;margin-bottom:16px}\
.badge{font-size:12px;border:1px solid #d0d7de;border-radius:2em;padding:2px 8px;margin-left:8px}\
.faint{color:#656d76}\
.row{display:flex;justify-content:space-between;gap:16px;padding:6px 0;border-top:1px solid #eaeef2}\
.markdown-body pre{background:#f6f8fa;padding:12px;overflow:auto}\
.admonition{border-left:4px solid #0969da;padding:0 12px}";

/// Data container for overview page generation.
pub struct OverviewData<'a> {
    pub location: &'a RepoLocation,
    pub vendor: VendorKind,
    pub git_ref: &'a str,
    pub readme: &'a RenderedDocument,
    pub summary: &'a Summary,
    pub archive_url: &'a str,
}

/// Generates the overview page: header, README, latest commits and tags.
///
/// README HTML is embedded as is, so it must come out of the sanitizing
/// pipeline.
pub fn overview_page(data: OverviewData<'_>) -> Markup {
    let title = data.location.namespace();

    page_wrapper(
        title,
        html! {
            header.repo-card {
                h1 {
                    a href=(data.location.web_url()) { (title) }
                    span.badge { (data.vendor.name()) }
                    span.badge { (data.git_ref) }
                }
                a href=(data.archive_url) { "Download archive" }
            }

            section.repo-card.markdown-body {
                @match data.readme.path() {
                    Some(path) => {
                        p.faint { (path) }
                        (PreEscaped(data.readme.html()))
                    },
                    None => p.faint { "No README found." },
                }
            }

            section.repo-card {
                h2 { "Latest commits" }
                (commit_rows(&data.summary.latest_commits))
            }

            section.repo-card {
                h2 { "Latest tags" }
                (tag_rows(&data.summary.latest_tags))
            }
        },
    )
}

fn page_wrapper(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Forgeview" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                div.container {
                    (body)
                }
            }
        }
    }
}

fn commit_rows(commits: &[CommitRecord]) -> Markup {
    html! {
        @if commits.is_empty() {
            p.faint { "No commits." }
        }
        @for commit in commits {
            div.row {
                a href=(commit.url) { (commit.title) }
                span.faint { (commit.created_at) }
            }
        }
    }
}

fn tag_rows(tags: &[TagRecord]) -> Markup {
    html! {
        @if tags.is_empty() {
            p.faint { "No tags." }
        }
        @for tag in tags {
            div.row {
                a href=(tag.url) { (tag.name) }
                span.faint { (tag.created_at) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Summary {
        Summary {
            latest_commits: vec![CommitRecord {
                title: "Fix <parser>".to_string(),
                created_at: "2024-01-01".to_string(),
                url: "https://github.com/acme/widgets/commit/a1".to_string(),
            }],
            latest_tags: Vec::new(),
        }
    }

    #[test]
    fn test_overview_contains_sections() {
        // Arrange
        let location = RepoLocation::new("https://github.com", "acme/widgets");
        let readme = RenderedDocument::found("README.md", "<h1>Widgets</h1>");
        let summary = summary();

        // Act
        let html = overview_page(OverviewData {
            location: &location,
            vendor: VendorKind::GitHub,
            git_ref: "main",
            readme: &readme,
            summary: &summary,
            archive_url: "https://github.com/acme/widgets/archive/main.zip",
        })
        .into_string();

        // Assert
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>acme/widgets - Forgeview</title>"));
        assert!(html.contains("<h1>Widgets</h1>"));
        assert!(html.contains("Fix &lt;parser&gt;"));
        assert!(html.contains("No tags."));
        assert!(html.contains("archive/main.zip"));
    }

    #[test]
    fn test_overview_without_readme() {
        // Arrange
        let location = RepoLocation::new("https://gitlab.com", "group/project");
        let readme = RenderedDocument::empty();
        let summary = Summary {
            latest_commits: Vec::new(),
            latest_tags: Vec::new(),
        };

        // Act
        let html = overview_page(OverviewData {
            location: &location,
            vendor: VendorKind::GitLab,
            git_ref: "HEAD",
            readme: &readme,
            summary: &summary,
            archive_url: "",
        })
        .into_string();

        // Assert
        assert!(html.contains("No README found."));
        assert!(html.contains("No commits."));
        assert!(html.contains("GitLab"));
    }
}
