//! Heritage list scraping.
//!
//! Downloads the French Wikipedia list of World Heritage sites in France and
//! turns the site table into [`HeritageSite`] records.

use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::coords::{CoordinateParser, Position};

pub const DEFAULT_SOURCE_URL: &str =
    "https://fr.wikipedia.org/wiki/Liste_du_patrimoine_mondial_en_France";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// The page opens with a summary table; the site list is the second one.
const SITE_TABLE_INDEX: usize = 1;
const MIN_CELLS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SiteKind {
    #[serde(rename = "Culturel")]
    Cultural,
    #[serde(rename = "Naturel")]
    Natural,
    #[serde(rename = "Mixte")]
    Mixed,
}

impl SiteKind {
    pub const ALL: [SiteKind; 3] = [SiteKind::Cultural, SiteKind::Natural, SiteKind::Mixed];

    /// Anything that is neither natural nor mixed is cultural.
    fn classify(text: &str) -> Self {
        if text.contains("Naturel") {
            SiteKind::Natural
        } else if text.contains("Mixte") {
            SiteKind::Mixed
        } else {
            SiteKind::Cultural
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SiteKind::Cultural => "Culturel",
            SiteKind::Natural => "Naturel",
            SiteKind::Mixed => "Mixte",
        }
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeritageSite {
    pub name: String,
    pub region: String,
    /// Year of inscription.
    pub year: Option<u16>,
    pub kind: SiteKind,
    /// Coordinate cell as printed.
    pub coordinates: String,
    pub position: Option<Position>,
}

pub fn fetch_page(url: &str) -> Result<String> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
    let http = Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    info!(%url, "downloading heritage list");
    let response = http
        .get(url)
        .send()
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()
        .context("heritage list request returned an error status")?;
    let body = response
        .text()
        .with_context(|| format!("reading response body from {url}"))?;
    debug!(bytes = body.len(), "heritage list downloaded");
    Ok(body)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow!("invalid selector {css:?}: {err:?}"))
}

/// Visible text of a cell with runs of whitespace collapsed.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_year(text: &str) -> Option<u16> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse().ok())
}

/// Extracts every complete row of the site table.
pub fn parse_sites(html: &str, coordinates: &CoordinateParser) -> Result<Vec<HeritageSite>> {
    let document = Html::parse_document(html);
    let tables = selector("table.wikitable")?;
    let rows = selector("tr")?;
    let cells = selector("td")?;
    let external_link = selector("a.external.text")?;

    let Some(table) = document.select(&tables).nth(SITE_TABLE_INDEX) else {
        bail!("site table not found (expected at least two wikitable tables)");
    };

    let mut sites = Vec::new();
    for row in table.select(&rows).skip(1) {
        let row_cells: Vec<ElementRef<'_>> = row.select(&cells).collect();
        if row_cells.len() < MIN_CELLS {
            continue;
        }
        let coordinate_text = row_cells[5]
            .select(&external_link)
            .next()
            .map(cell_text)
            .unwrap_or_else(|| cell_text(row_cells[5]));
        let site = HeritageSite {
            name: cell_text(row_cells[0]),
            region: cell_text(row_cells[1]),
            year: first_year(&cell_text(row_cells[2])),
            kind: SiteKind::classify(&cell_text(row_cells[4])),
            position: coordinates.parse(&coordinate_text),
            coordinates: coordinate_text,
        };
        if site.position.is_none() {
            debug!(site = %site.name, raw = %site.coordinates, "no usable coordinates");
        }
        sites.push(site);
    }

    if sites.is_empty() {
        warn!("site table has no complete rows");
    }
    info!(
        sites = sites.len(),
        located = sites.iter().filter(|s| s.position.is_some()).count(),
        "heritage list parsed"
    );
    Ok(sites)
}
