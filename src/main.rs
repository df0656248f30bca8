//! mdpress - a markdown content server with recursive templates.

mod cli;
mod config;
mod content;
mod logger;
mod render;
mod serve;
mod site;
mod template;
mod watch;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use serve::serve_site;
use site::Site;
use std::{io::Write, sync::Arc};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Arc::new(load_config(&cli)?);
    let site = Arc::new(Site::open(Arc::clone(&config))?);

    match &cli.command {
        Commands::Serve { .. } => serve_site(site),
        Commands::Render { path } => render_one(&site, path),
        Commands::Check => check(&site),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let config = SiteConfig::load(cli)?;
    if !config.config_path.exists() {
        log!("config"; "{} not found, using defaults", config.config_path.display());
    }
    config.validate()?;
    Ok(config)
}

/// Run one request through the full flow and print the page.
fn render_one(site: &Site, path: &str) -> Result<()> {
    match site.handle(path) {
        Ok(html) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
        Err(err) => {
            let status = err.status();
            match err {
                render::PageError::Render(cause) => {
                    Err(cause.context(format!("{status} rendering {path}")))
                }
                other => bail!("{status} {path}: {other}"),
            }
        }
    }
}

/// Report what the server would use.
fn check(site: &Site) -> Result<()> {
    let config = site.config();
    log!("check"; "project  {}", config.root.display());
    log!("check"; "content  {}", config.content.root.display());
    log!("check"; "template {}", config.content.templates.display());
    log!("check"; "public   {}", config.content.public.display());
    let blacklist = site.guard().snapshot();
    if blacklist.is_empty() {
        log!("check"; "blacklist {} (no rules)", site.guard().source().display());
    } else {
        log!("check"; "blacklist {} ({} rules)", site.guard().source().display(), blacklist.len());
    }

    let landing = config.content.landing_path();
    if !landing.is_file() {
        log!("check"; "warning: landing page {} is missing", landing.display());
    }
    log!("check"; "ok");
    Ok(())
}
