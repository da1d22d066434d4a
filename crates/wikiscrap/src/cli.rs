use std::path::PathBuf;

use clap::{Parser, Subcommand};
use siteconfig::{parse_antialias, AntialiasSetting, PowerSetting, SiteConfig};

#[derive(Parser, Debug)]
#[command(
    name = "wikiscrap",
    author,
    version,
    about = "WikiScrap UNESCO landing page over the ColorBends background",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to `wikiscrap.toml` in the config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Initial window size (e.g. `1280x800`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<String>,

    /// Open borderless fullscreen on the current monitor.
    #[arg(long)]
    pub fullscreen: bool,

    /// Frame cap (0 = follow vsync).
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Render a single frame evaluated at this timestamp instead of animating.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub still_time: Option<f32>,

    /// Comma separated hex colours (e.g. `#ff0000,#00ff00,#0000ff`).
    #[arg(long, value_name = "LIST", value_parser = parse_colors)]
    pub colors: Option<ColorList>,

    /// Base rotation in degrees.
    #[arg(long, value_name = "DEGREES", value_parser = parse_finite, allow_negative_numbers = true)]
    pub rotation: Option<f32>,

    /// Extra rotation in degrees per second.
    #[arg(long, value_name = "DEG/S", value_parser = parse_finite, allow_negative_numbers = true)]
    pub auto_rotate: Option<f32>,

    #[arg(long, value_parser = parse_finite, allow_negative_numbers = true)]
    pub speed: Option<f32>,

    #[arg(long, value_parser = parse_finite)]
    pub scale: Option<f32>,

    #[arg(long, value_parser = parse_finite)]
    pub frequency: Option<f32>,

    #[arg(long, value_parser = parse_finite, allow_negative_numbers = true)]
    pub warp_strength: Option<f32>,

    #[arg(long, value_parser = parse_finite, allow_negative_numbers = true)]
    pub mouse_influence: Option<f32>,

    #[arg(long, value_parser = parse_finite, allow_negative_numbers = true)]
    pub parallax: Option<f32>,

    #[arg(long, value_parser = parse_finite)]
    pub noise: Option<f32>,

    /// Let the desktop show through where the field has no colour.
    #[arg(long, value_name = "BOOL")]
    pub transparent: Option<bool>,

    /// Anti-aliasing policy: `auto`, `off`, or an MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<AntialiasSetting>,

    /// Adapter preference: `low` or `high`.
    #[arg(long, value_name = "POWER", value_parser = parse_power)]
    pub power: Option<PowerSetting>,

    /// Directory or `http(s)://` URL the buttons navigate into.
    #[arg(long, value_name = "DIR|URL")]
    pub site_root: Option<String>,

    /// Log navigation targets instead of opening them.
    #[arg(long)]
    pub dry_run_navigation: bool,

    /// Do not reload the configuration file when it changes.
    #[arg(long)]
    pub no_watch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorList(pub Vec<String>);

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or create the configuration file.
    Config(ConfigCommand),
    /// Download the heritage list and write the map and statistics pages.
    Scrape(ScrapeArgs),
}

#[derive(Parser, Debug)]
pub struct ScrapeArgs {
    /// Page holding the heritage list.
    #[arg(long, value_name = "URL", default_value = crate::scrape::DEFAULT_SOURCE_URL)]
    pub url: String,

    /// Parse a saved copy of the page instead of downloading it.
    #[arg(long, value_name = "FILE", conflicts_with = "url")]
    pub input: Option<PathBuf>,

    /// Output directory; defaults to the local site root.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (file plus command-line overrides).
    Show,
    /// Print the resolved configuration paths.
    Where,
    /// Write the default configuration if no file exists yet.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

impl RunArgs {
    /// Layers command-line values over `config`.
    pub fn apply_overrides(&self, config: &mut SiteConfig) {
        let background = &mut config.background;
        if let Some(ColorList(colors)) = &self.colors {
            background.colors = colors.clone();
        }
        let knobs = [
            (self.rotation, &mut background.rotation),
            (self.auto_rotate, &mut background.auto_rotate),
            (self.speed, &mut background.speed),
            (self.scale, &mut background.scale),
            (self.frequency, &mut background.frequency),
            (self.warp_strength, &mut background.warp_strength),
            (self.mouse_influence, &mut background.mouse_influence),
            (self.parallax, &mut background.parallax),
            (self.noise, &mut background.noise),
        ];
        for (value, slot) in knobs {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(transparent) = self.transparent {
            background.transparent = transparent;
        }

        let window = &mut config.window;
        if let Some(size) = &self.size {
            window.size = Some(size.clone());
        }
        if self.fullscreen {
            window.fullscreen = true;
        }
        if let Some(fps) = self.fps {
            window.fps = Some(fps);
        }
        if let Some(antialias) = self.antialias {
            window.antialias = Some(antialias);
        }
        if let Some(power) = self.power {
            window.power = power;
        }

        if let Some(root) = &self.site_root {
            config.site.root = Some(root.clone());
        }
    }
}

fn parse_size(value: &str) -> Result<String, String> {
    let (width, height) = siteconfig::parse_dimensions(value)?;
    Ok(format!("{width}x{height}"))
}

fn parse_finite(value: &str) -> Result<f32, String> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !parsed.is_finite() {
        return Err(format!("'{value}' must be finite"));
    }
    Ok(parsed)
}

fn parse_fps(value: &str) -> Result<f32, String> {
    let fps = parse_finite(value)?;
    if fps < 0.0 {
        return Err("fps must be zero or positive".into());
    }
    Ok(fps)
}

fn parse_seconds(value: &str) -> Result<f32, String> {
    let seconds = parse_finite(value)?;
    if seconds < 0.0 {
        return Err("timestamp must not be negative".into());
    }
    Ok(seconds)
}

pub fn parse_power(value: &str) -> Result<PowerSetting, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" | "integrated" => Ok(PowerSetting::Low),
        "high" | "high-performance" | "discrete" => Ok(PowerSetting::High),
        other => Err(format!("unknown power preference '{other}'; expected low or high")),
    }
}

/// Splits a comma separated list and checks every entry is a hex colour.
pub fn parse_colors(value: &str) -> Result<ColorList, String> {
    let colors: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect();
    for color in &colors {
        colorbends::parse_hex_color(color).map_err(|err| err.to_string())?;
    }
    Ok(ColorList(colors))
}
