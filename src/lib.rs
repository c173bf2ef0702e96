//! README rendering and repository metadata over GitHub and GitLab.

mod config;
mod error;
mod location;
mod page;
pub mod readme;
mod repository;
mod settings;
pub mod vendor;

pub use config::{Command, Config};
pub use error::ConfigError;
pub use location::RepoLocation;
pub use page::{OverviewData, overview_page};
pub use readme::{
    Candidate, DocumentFormat, LinkRewriteContext, Probe, ReadmePipeline, RenderedDocument,
    SanitizationPolicy, render_readme,
};
pub use repository::{FALLBACK_REF, Repository};
pub use settings::{
    ApiOverrides, DEFAULT_LISTING_LIMIT, DEFAULT_TIMEOUT_SECS, Limits, ReadmeSettings, Settings,
};
pub use vendor::{ClientOptions, VendorClient, VendorKind};
