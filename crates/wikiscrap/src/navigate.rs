//! Turns button activations into something the desktop can open.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use siteconfig::{PageSettings, SiteSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    Url(String),
    File(PathBuf),
}

impl fmt::Display for NavTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavTarget::Url(url) => f.write_str(url),
            NavTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub trait Navigator {
    fn open(&self, target: &NavTarget) -> Result<()>;
}

/// Hands targets to the platform opener.
#[derive(Debug, Default)]
pub struct SystemNavigator;

impl Navigator for SystemNavigator {
    fn open(&self, target: &NavTarget) -> Result<()> {
        if let NavTarget::File(path) = target {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "navigation target does not exist");
            }
        }
        let mut command = opener_command(&target.to_string());
        let status = command
            .status()
            .with_context(|| format!("failed to launch opener for {target}"))?;
        if status.success() {
            Ok(())
        } else {
            Err(anyhow!(
                "opener exited with status {} for {target}",
                status.code().unwrap_or(-1)
            ))
        }
    }
}

#[cfg(target_os = "macos")]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(target);
    command
}

#[cfg(target_os = "windows")]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(target);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(target);
    command
}

/// Logs targets instead of opening them.
#[derive(Debug, Default)]
pub struct DryRunNavigator;

impl Navigator for DryRunNavigator {
    fn open(&self, target: &NavTarget) -> Result<()> {
        tracing::info!(%target, "dry run; not opening navigation target");
        Ok(())
    }
}

pub fn navigator(dry_run: bool) -> Box<dyn Navigator> {
    if dry_run {
        Box::new(DryRunNavigator)
    } else {
        Box::new(SystemNavigator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SiteRoot {
    Url(String),
    Dir(PathBuf),
}

/// Resolves page hrefs against the configured site root. Without a root the
/// pages are looked up next to the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteResolver {
    root: SiteRoot,
    base_path: String,
}

impl SiteResolver {
    pub fn new(site: &SiteSettings, config_dir: &Path) -> Self {
        let root = match site.root.as_deref().map(str::trim) {
            Some(root) if is_web_url(root) => SiteRoot::Url(root.to_string()),
            Some(root) if !root.is_empty() => SiteRoot::Dir(PathBuf::from(root)),
            _ => SiteRoot::Dir(config_dir.to_path_buf()),
        };
        Self {
            root,
            base_path: site.base_path.clone(),
        }
    }

    /// Directory the pages live in, when the root is not a web URL.
    pub fn local_root(&self) -> Option<&Path> {
        match &self.root {
            SiteRoot::Dir(dir) => Some(dir),
            SiteRoot::Url(_) => None,
        }
    }

    pub fn resolve(&self, href: &str) -> NavTarget {
        let href = href.trim();
        if has_scheme(href) {
            return NavTarget::Url(href.to_string());
        }

        let relative = if href.starts_with('/') {
            href.strip_prefix(self.base_path.as_str())
                .unwrap_or(href)
                .trim_start_matches('/')
        } else {
            href
        };

        match &self.root {
            SiteRoot::Url(base) => NavTarget::Url(join_url(base, relative)),
            SiteRoot::Dir(dir) => {
                let path_part = relative
                    .split(['?', '#'])
                    .next()
                    .unwrap_or_default();
                let mut path = dir.clone();
                for segment in path_part.split('/') {
                    match segment {
                        "" | "." => {}
                        ".." => {
                            path.pop();
                        }
                        other => path.push(other),
                    }
                }
                NavTarget::File(path)
            }
        }
    }
}

fn is_web_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn has_scheme(value: &str) -> bool {
    value.contains("://") || value.to_ascii_lowercase().starts_with("mailto:")
}

/// Joins a relative reference onto a URL directory, folding `.` and `..`
/// segments. `..` never climbs above the host.
fn join_url(base: &str, relative: &str) -> String {
    let scheme_end = base.find("://").map(|i| i + 3).unwrap_or(0);
    let host_end = base[scheme_end..]
        .find('/')
        .map(|i| i + scheme_end)
        .unwrap_or(base.len());
    let origin = &base[..host_end];

    let mut segments: Vec<&str> = base[host_end..]
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    if !base.ends_with('/') {
        // The last segment names a document, not a directory.
        segments.pop();
    }

    let (path_part, suffix) = match relative.find(['?', '#']) {
        Some(index) => relative.split_at(index),
        None => (relative, ""),
    };
    for segment in path_part.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut url = String::from(origin);
    url.push('/');
    url.push_str(&segments.join("/"));
    if path_part.ends_with('/') && !segments.is_empty() {
        url.push('/');
    }
    url.push_str(suffix);
    url
}

/// Handles a click on the button at `index`. Returns the opened target, or
/// `None` when the button has no destination.
pub fn activate(
    page: &PageSettings,
    index: u32,
    resolver: &SiteResolver,
    navigator: &dyn Navigator,
) -> Result<Option<NavTarget>> {
    let Some(action) = page.actions.get(index as usize) else {
        tracing::debug!(index, "activation outside the action list");
        return Ok(None);
    };
    let Some(href) = action.href.as_deref() else {
        tracing::info!(label = %action.label, "button has no destination");
        return Ok(None);
    };
    let target = resolver.resolve(href);
    tracing::info!(label = %action.label, %target, "navigating");
    navigator.open(&target)?;
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingNavigator {
        opened: RefCell<Vec<NavTarget>>,
    }

    impl Navigator for RecordingNavigator {
        fn open(&self, target: &NavTarget) -> Result<()> {
            self.opened.borrow_mut().push(target.clone());
            Ok(())
        }
    }

    fn url_resolver(root: &str) -> SiteResolver {
        let site = SiteSettings {
            root: Some(root.into()),
            ..SiteSettings::default()
        };
        SiteResolver::new(&site, Path::new("/unused"))
    }

    #[test]
    fn relative_hrefs_join_url_roots() {
        let resolver = url_resolver("https://example.org/wikiscrap/");
        assert_eq!(
            resolver.resolve("./carte_unesco_france.html"),
            NavTarget::Url("https://example.org/wikiscrap/carte_unesco_france.html".into())
        );
        assert_eq!(
            resolver.resolve("../other/page.html#top"),
            NavTarget::Url("https://example.org/other/page.html#top".into())
        );
        assert_eq!(
            resolver.resolve("/wikiscrap/code.html"),
            NavTarget::Url("https://example.org/wikiscrap/code.html".into())
        );
    }

    #[test]
    fn url_root_without_trailing_slash_drops_document() {
        let resolver = url_resolver("https://example.org/wikiscrap/index.html");
        assert_eq!(
            resolver.resolve("code.html"),
            NavTarget::Url("https://example.org/wikiscrap/code.html".into())
        );
        let bare = url_resolver("https://example.org");
        assert_eq!(
            bare.resolve("../../code.html"),
            NavTarget::Url("https://example.org/code.html".into())
        );
    }

    #[test]
    fn absolute_urls_pass_through() {
        let resolver = url_resolver("https://example.org/wikiscrap/");
        assert_eq!(
            resolver.resolve("https://github.com/gsagot/wikiscrap"),
            NavTarget::Url("https://github.com/gsagot/wikiscrap".into())
        );
        assert_eq!(
            resolver.resolve("mailto:team@example.org"),
            NavTarget::Url("mailto:team@example.org".into())
        );
    }

    #[test]
    fn directory_roots_resolve_to_files() {
        let site = SiteSettings {
            root: Some("/srv/site".into()),
            ..SiteSettings::default()
        };
        let resolver = SiteResolver::new(&site, Path::new("/unused"));
        assert_eq!(
            resolver.resolve("./code.html?tab=1"),
            NavTarget::File(PathBuf::from("/srv/site/code.html"))
        );
        assert_eq!(
            resolver.resolve("/wikiscrap/carte_unesco_france.html"),
            NavTarget::File(PathBuf::from("/srv/site/carte_unesco_france.html"))
        );
    }

    #[test]
    fn missing_root_falls_back_to_config_dir() {
        let resolver = SiteResolver::new(
            &SiteSettings::default(),
            Path::new("/home/me/.config/wikiscrap"),
        );
        assert_eq!(
            resolver.resolve("./code.html"),
            NavTarget::File(PathBuf::from("/home/me/.config/wikiscrap/code.html"))
        );
        assert_eq!(
            resolver.local_root(),
            Some(Path::new("/home/me/.config/wikiscrap"))
        );
        assert_eq!(url_resolver("https://example.org/").local_root(), None);
    }

    #[test]
    fn activation_opens_only_buttons_with_targets() {
        let page = PageSettings::default();
        let resolver = url_resolver("https://example.org/wikiscrap/");
        let navigator = RecordingNavigator::default();

        let first = activate(&page, 0, &resolver, &navigator).unwrap();
        assert_eq!(
            first,
            Some(NavTarget::Url(
                "https://example.org/wikiscrap/carte_unesco_france.html".into()
            ))
        );
        assert_eq!(activate(&page, 2, &resolver, &navigator).unwrap(), None);
        assert_eq!(activate(&page, 42, &resolver, &navigator).unwrap(), None);
        assert_eq!(navigator.opened.borrow().len(), 1);
    }

    #[test]
    fn dry_run_never_fails() {
        let navigator = navigator(true);
        navigator
            .open(&NavTarget::File(PathBuf::from("/does/not/exist.html")))
            .unwrap();
    }
}
