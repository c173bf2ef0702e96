//! Command line configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::settings::Settings;
use crate::vendor::VendorKind;

/// Command line configuration for Forgeview.
#[derive(Debug, Clone, Parser)]
#[command(name = "forgeview", version, about, long_about = None)]
pub struct Config {
    /// Repository web URL, e.g. https://gitlab.com/group/project
    pub url: String,

    /// Vendor id (github, gitlab); inferred for github.com and gitlab.com
    #[arg(long, value_parser = parse_vendor)]
    pub vendor: Option<VendorKind>,

    /// API token
    #[arg(long, env = "FORGEVIEW_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Settings file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Branch, tag or commit used for README and archive links
    #[arg(long = "ref")]
    pub git_ref: Option<String>,

    /// Allow plain HTTP repository URLs
    #[arg(long)]
    pub insecure: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print sanitized README HTML
    Readme {
        /// Print path and HTML as JSON
        #[arg(long)]
        json: bool,
    },
    /// Latest commits and tags
    Summary,
    /// Latest commits
    Commits,
    /// Latest tags
    Tags,
    /// Commit authors, or issue authors with --issues
    Contributors {
        #[arg(long)]
        issues: bool,
    },
    /// Project members
    Members,
    /// Language shares in percent
    Languages,
    /// Source archive download URL
    ArchiveUrl {
        #[arg(long, default_value = "zip")]
        extension: String,
        /// Defaults to the resolved repository reference
        #[arg(long = "ref")]
        at_ref: Option<String>,
    },
    /// Write a standalone HTML overview page
    Page {
        #[arg(short, long, default_value = "forgeview.html")]
        output: PathBuf,
    },
}

fn parse_vendor(value: &str) -> Result<VendorKind, String> {
    value.parse().map_err(|err: crate::ConfigError| err.to_string())
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Loads the settings file, if any, and applies command line overrides.
    ///
    /// # Errors
    ///
    /// Returns error if the settings file cannot be read or is invalid.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(token) = &self.token {
            settings.token = Some(token.clone());
        }
        if let Some(git_ref) = &self.git_ref {
            settings.git_ref = Some(git_ref.clone());
        }
        if self.insecure {
            settings.allow_insecure = true;
        }

        settings
            .validate()
            .context("Invalid command line overrides")?;
        Ok(settings)
    }

    /// Default log filter for the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "forgeview=info",
            1 => "forgeview=debug",
            _ => "forgeview=trace",
        }
    }
}
