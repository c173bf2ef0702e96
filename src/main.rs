use anyhow::{Context, Result};
use forgeview::{Command, Config, OverviewData, Repository, overview_page};
use serde::Serialize;
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a stderr subscriber honouring `RUST_LOG`, else `default_filter`.
fn init_logging(default_filter: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("Failed to install tracing subscriber")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn write_page(repository: &Repository, output: &std::path::Path) -> Result<()> {
    let git_ref = repository.resolve_ref();
    let readme = repository.get_readme_at(&git_ref);
    let summary = repository
        .get_summary()
        .context("Failed to fetch latest commits and tags")?;
    let archive_url = repository.get_archive_url("zip", Some(&git_ref));

    let page = overview_page(OverviewData {
        location: repository.location(),
        vendor: repository.kind(),
        git_ref: &git_ref,
        readme: &readme,
        summary: &summary,
        archive_url: &archive_url,
    });

    fs::write(output, page.into_string())
        .with_context(|| format!("Failed to write page: {}", output.display()))?;
    info!(path = %output.display(), "wrote overview page");

    Ok(())
}

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(config.log_filter())?;

    let settings = config.settings().context("Invalid configuration")?;
    let repository = Repository::open(&config.url, config.vendor, settings)
        .with_context(|| format!("Failed to open repository: {}", config.url))?;

    match &config.command {
        Command::Readme { json } => {
            let document = repository.get_readme();
            if !document.is_found() {
                warn!("no README found");
            }
            if *json {
                print_json(&document)?;
            } else {
                println!("{}", document.html());
            }
        }
        Command::Summary => {
            print_json(&repository.get_summary().context("Failed to fetch summary")?)?;
        }
        Command::Commits => {
            print_json(
                &repository
                    .get_latest_commits()
                    .context("Failed to fetch commits")?,
            )?;
        }
        Command::Tags => {
            print_json(&repository.get_latest_tags().context("Failed to fetch tags")?)?;
        }
        Command::Contributors { issues } => {
            let contributors = if *issues {
                repository.get_issues_contributors()
            } else {
                repository.get_commits_contributors()
            };
            print_json(&contributors.context("Failed to fetch contributors")?)?;
        }
        Command::Members => {
            print_json(&repository.get_members().context("Failed to fetch members")?)?;
        }
        Command::Languages => {
            print_json(&repository.get_languages().context("Failed to fetch languages")?)?;
        }
        Command::ArchiveUrl { extension, at_ref } => {
            println!("{}", repository.get_archive_url(extension, at_ref.as_deref()));
        }
        Command::Page { output } => write_page(&repository, output)?,
    }

    Ok(())
}
