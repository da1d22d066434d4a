use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colorbends::{TextEngine, WindowRuntime, WindowSignal};
use siteconfig::SiteConfig;
use tracing_subscriber::EnvFilter;

use crate::bindings;
use crate::cli::RunArgs;
use crate::landing;
use crate::navigate::{self, SiteResolver};
use crate::paths::AppPaths;
use crate::watch::ConfigWatcher;

const SIGNAL_POLL: Duration = Duration::from_millis(50);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Reads the file (or the defaults), layers the flags on top and validates
/// the result.
pub fn load_config(path: &Path, args: &RunArgs) -> Result<SiteConfig> {
    let mut config = SiteConfig::load_or_default(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    args.apply_overrides(&mut config);
    config
        .validate()
        .context("command-line overrides produced an invalid configuration")?;
    Ok(config)
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config_path = paths.resolve_config(args.config.as_deref());
    let mut config = load_config(&config_path, &args)?;
    let site_dir = config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(paths.config_dir())
        .to_path_buf();

    tracing::info!(
        config = %config_path.display(),
        colors = config.background.colors.len(),
        still = ?args.still_time,
        "starting wikiscrap landing page"
    );

    let text = TextEngine::new();
    let renderer_config = bindings::renderer_config(&config, &text, args.still_time)?;
    let session = Session {
        window_transparent: renderer_config.background.transparent,
        still_time: args.still_time,
        text,
    };
    let runtime = WindowRuntime::spawn(renderer_config)?;
    let navigator = navigate::navigator(args.dry_run_navigation);
    let mut resolver = SiteResolver::new(&config.site, &site_dir);
    let mut watcher = if args.no_watch {
        None
    } else {
        match ConfigWatcher::new(config_path.clone(), config.window.reload_debounce) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                tracing::warn!(error = ?err, "configuration changes will not be picked up");
                None
            }
        }
    };

    'main: loop {
        for signal in runtime.take_signals() {
            match signal {
                WindowSignal::Activated(index) => {
                    if let Err(err) =
                        navigate::activate(&config.page, index, &resolver, navigator.as_ref())
                    {
                        tracing::warn!(error = ?err, "navigation failed");
                    }
                }
                WindowSignal::Closed => {
                    tracing::info!("window closed");
                    break 'main;
                }
            }
        }
        if runtime.is_finished() {
            break;
        }

        if let Some(watcher) = watcher.as_mut() {
            if watcher.poll(Instant::now()) {
                match load_config(watcher.path(), &args) {
                    Ok(next) => {
                        apply_reload(&runtime, &session, &config, &next)?;
                        watcher.set_debounce(next.window.reload_debounce);
                        resolver = SiteResolver::new(&next.site, &site_dir);
                        config = next;
                    }
                    Err(err) => {
                        tracing::warn!(error = ?err, "keeping previous configuration");
                    }
                }
            }
        }

        thread::sleep(SIGNAL_POLL);
    }

    runtime.shutdown()
}

/// What stays fixed for the lifetime of the window.
struct Session {
    /// Whether the window was created with an alpha channel.
    window_transparent: bool,
    still_time: Option<f32>,
    text: TextEngine,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ReloadPlan {
    background: bool,
    overlay: bool,
    title: bool,
    policy: bool,
    /// Settings that only take effect on the next launch.
    restart: Vec<&'static str>,
}

fn plan_reload(current: &SiteConfig, next: &SiteConfig, window_transparent: bool) -> ReloadPlan {
    let mut restart = Vec::new();
    if next.background.transparent
        && !current.background.transparent
        && !window_transparent
    {
        restart.push("background.transparent");
    }
    if current.window.size != next.window.size {
        restart.push("window.size");
    }
    if current.window.fullscreen != next.window.fullscreen {
        restart.push("window.fullscreen");
    }
    if current.window.antialias != next.window.antialias {
        restart.push("window.antialias");
    }
    if current.window.power != next.window.power {
        restart.push("window.power");
    }
    ReloadPlan {
        background: current.background != next.background,
        overlay: current.page != next.page,
        title: current.page.title != next.page.title,
        policy: current.window.fps != next.window.fps,
        restart,
    }
}

fn apply_reload(
    runtime: &WindowRuntime,
    session: &Session,
    current: &SiteConfig,
    next: &SiteConfig,
) -> Result<()> {
    let plan = plan_reload(current, next, session.window_transparent);
    if plan == ReloadPlan::default() {
        tracing::debug!("configuration touched without visible changes");
        return Ok(());
    }
    tracing::info!(
        background = plan.background,
        overlay = plan.overlay,
        policy = plan.policy,
        "applying configuration change"
    );

    if plan.background {
        match bindings::background_config(&next.background) {
            Ok(background) => runtime.configure(background)?,
            Err(err) => tracing::warn!(error = %err, "ignoring background change"),
        }
    }
    if plan.overlay {
        runtime.set_overlay(Some(landing::overlay_layout(
            next.page.clone(),
            session.text.clone(),
        )))?;
    }
    if plan.title {
        runtime.set_title(next.page.title.clone())?;
    }
    if plan.policy {
        runtime.set_policy(bindings::render_policy(&next.window, session.still_time))?;
    }
    for setting in plan.restart {
        tracing::warn!(setting, "change takes effect after a restart");
    }
    Ok(())
}
