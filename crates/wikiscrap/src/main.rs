mod bindings;
mod cli;
mod coords;
mod landing;
mod navigate;
mod paths;
mod publish;
mod run;
mod scrape;
mod watch;

use std::fs;

use anyhow::{anyhow, Context, Result};
use cli::{Command, ConfigAction, RunArgs, ScrapeArgs};
use coords::CoordinateParser;
use navigate::SiteResolver;
use paths::AppPaths;
use siteconfig::SiteConfig;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(config_cmd)) => handle_config_command(config_cmd.action, &cli.run),
        Some(Command::Scrape(scrape_args)) => handle_scrape(&scrape_args, &cli.run),
        None => run::run(cli.run),
    }
}

fn handle_config_command(action: ConfigAction, args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config_path = paths.resolve_config(args.config.as_deref());

    match action {
        ConfigAction::Show => {
            let config = run::load_config(&config_path, args)?;
            // Colours are only checked as strings until they reach the renderer.
            bindings::background_config(&config.background)
                .context("invalid colour in [background].colors")?;
            print!("{}", config.to_toml_string()?);
        }
        ConfigAction::Where => {
            println!("Configuration:");
            println!("  dir:   {}", paths.config_dir().display());
            println!(
                "  file:  {} ({})",
                config_path.display(),
                if config_path.exists() {
                    "present"
                } else {
                    "missing; defaults apply"
                }
            );
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                println!(
                    "Configuration already exists at {} (use --force to overwrite)",
                    config_path.display()
                );
                return Ok(());
            }
            SiteConfig::default()
                .save(&config_path)
                .with_context(|| format!("failed to write {}", config_path.display()))?;
            println!("Wrote default configuration to {}", config_path.display());
        }
    }
    Ok(())
}

fn handle_scrape(scrape_args: &ScrapeArgs, args: &RunArgs) -> Result<()> {
    let out_dir = match &scrape_args.out {
        Some(dir) => dir.clone(),
        None => {
            let paths = AppPaths::discover()?;
            let config_path = paths.resolve_config(args.config.as_deref());
            let config = run::load_config(&config_path, args)?;
            let config_dir = config_path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(paths.config_dir());
            let resolver = SiteResolver::new(&config.site, config_dir);
            resolver
                .local_root()
                .map(|dir| dir.to_path_buf())
                .ok_or_else(|| {
                    anyhow!("the site root is a web URL; pass --out to choose a directory")
                })?
        }
    };

    let html = match &scrape_args.input {
        Some(file) => fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?,
        None => scrape::fetch_page(&scrape_args.url)?,
    };
    let parser = CoordinateParser::new().context("failed to build coordinate patterns")?;
    let sites = scrape::parse_sites(&html, &parser)?;
    let pages = publish::publish(&out_dir, &sites)?;

    println!("Scraped {} sites", sites.len());
    println!("  map:   {}", pages.map.display());
    println!("  stats: {}", pages.stats.display());
    println!("  data:  {}", pages.data.display());
    Ok(())
}
