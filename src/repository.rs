//! One repository, whatever vendor hosts it.

use anyhow::Result;
use tracing::{info, warn};

use crate::location::RepoLocation;
use crate::readme::{ReadmePipeline, RenderedDocument, RendererOverrides, SanitizationPolicy};
use crate::settings::Settings;
use crate::vendor::{
    self, CommitRecord, ContributorRecord, LanguageShares, MemberRecord, Summary, TagRecord,
    VendorClient, VendorKind,
};

/// Reference used when neither settings nor the vendor name one.
pub const FALLBACK_REF: &str = "HEAD";

/// Vendor client, README pipeline and settings for a repository URL.
pub struct Repository {
    client: Box<dyn VendorClient>,
    pipeline: ReadmePipeline,
    settings: Settings,
}

impl Repository {
    /// Opens the repository at `url`.
    ///
    /// The vendor is inferred from well-known hosts when `vendor` is `None`.
    /// Configuration is validated before any request is made.
    ///
    /// # Errors
    ///
    /// Returns error if the URL, vendor or settings are invalid, or the HTTP
    /// client cannot be built.
    pub fn open(url: &str, vendor: Option<VendorKind>, settings: Settings) -> Result<Self> {
        let location = RepoLocation::parse(url, settings.allow_insecure)?;
        let kind = match vendor {
            Some(kind) => kind,
            None => VendorKind::from_host(location.host_name())?,
        };

        let pipeline = ReadmePipeline::new(
            settings.candidates()?,
            SanitizationPolicy::default(),
            RendererOverrides::new(),
        )?;

        info!(%location, vendor = %kind, "opening repository");
        let client = vendor::connect(kind, location, &settings.client_options(kind))?;

        Ok(Self::with_client(client, pipeline, settings))
    }

    /// Assembles a repository from already built parts.
    pub fn with_client(
        client: Box<dyn VendorClient>,
        pipeline: ReadmePipeline,
        settings: Settings,
    ) -> Self {
        Self {
            client,
            pipeline,
            settings,
        }
    }

    pub fn kind(&self) -> VendorKind {
        self.client.kind()
    }

    pub fn location(&self) -> &RepoLocation {
        self.client.location()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reference to read files at: the configured one, else the default
    /// branch, else [`FALLBACK_REF`].
    pub fn resolve_ref(&self) -> String {
        if let Some(git_ref) = &self.settings.git_ref {
            return git_ref.clone();
        }

        match self.client.default_branch() {
            Ok(branch) => branch,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "default branch lookup failed, using {FALLBACK_REF}");
                FALLBACK_REF.to_string()
            }
        }
    }

    /// Finds, renders and sanitizes the README.
    pub fn get_readme(&self) -> RenderedDocument {
        let git_ref = self.resolve_ref();
        self.get_readme_at(&git_ref)
    }

    /// Like [`Repository::get_readme`] at an explicit reference.
    pub fn get_readme_at(&self, git_ref: &str) -> RenderedDocument {
        let context = self.client.link_context(git_ref);
        let probe = |path: &str| self.client.read_file(path, git_ref);
        self.pipeline.render(&probe, &context)
    }

    /// Latest commits and tags within the configured limits.
    ///
    /// # Errors
    ///
    /// Returns error if either listing fails.
    pub fn get_summary(&self) -> Result<Summary> {
        Ok(Summary {
            latest_commits: self.get_latest_commits()?,
            latest_tags: self.get_latest_tags()?,
        })
    }

    pub fn get_latest_commits(&self) -> Result<Vec<CommitRecord>> {
        self.client.latest_commits(self.settings.limits.latest_commits)
    }

    pub fn get_latest_tags(&self) -> Result<Vec<TagRecord>> {
        self.client.latest_tags(self.settings.limits.latest_tags)
    }

    /// Archive download URL; `git_ref` defaults to [`Repository::resolve_ref`].
    pub fn get_archive_url(&self, extension: &str, git_ref: Option<&str>) -> String {
        match git_ref {
            Some(git_ref) => self.client.archive_url(extension, git_ref),
            None => self.client.archive_url(extension, &self.resolve_ref()),
        }
    }

    pub fn get_commits_contributors(&self) -> Result<Vec<ContributorRecord>> {
        self.client.commits_contributors()
    }

    pub fn get_issues_contributors(&self) -> Result<Vec<ContributorRecord>> {
        self.client.issues_contributors()
    }

    pub fn get_members(&self) -> Result<Vec<MemberRecord>> {
        self.client.members()
    }

    pub fn get_languages(&self) -> Result<LanguageShares> {
        self.client.languages()
    }
}
