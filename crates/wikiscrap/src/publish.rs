//! Static pages generated from the scraped heritage list.
//!
//! `carte_unesco_france.html` is the page the landing page's first button
//! opens: a Leaflet map with one marker per site, coloured by kind, with a
//! legend. `statistiques_unesco.html` holds bar charts by region, decade and
//! kind, and `sites_unesco.json` the raw records.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::coords::Position;
use crate::scrape::{HeritageSite, SiteKind};

pub const MAP_PAGE: &str = "carte_unesco_france.html";
pub const STATS_PAGE: &str = "statistiques_unesco.html";
pub const DATA_FILE: &str = "sites_unesco.json";

/// Serial sites spread over many places have no single coordinate; they are
/// pinned on Notre-Dame-de-Lorette.
const SERIAL_SITE_POSITION: Position = Position::new(50.40, 2.71);
const MAP_CENTER: Position = Position::new(47.0, 2.0);
const MAP_ZOOM: u8 = 6;
const TOP_REGIONS: usize = 10;

fn kind_color(kind: SiteKind) -> &'static str {
    match kind {
        SiteKind::Cultural => "#3498db",
        SiteKind::Natural => "#27ae60",
        SiteKind::Mixed => "#e67e22",
    }
}

#[derive(Debug, Serialize)]
struct Marker<'a> {
    name: &'a str,
    region: &'a str,
    year: Option<u16>,
    kind: SiteKind,
    color: &'static str,
    lat: f64,
    lon: f64,
}

/// Sites that get a marker. Missing coordinates fall back to the serial
/// site pin and positions outside France are dropped.
fn markers(sites: &[HeritageSite]) -> Vec<Marker<'_>> {
    sites
        .iter()
        .filter_map(|site| {
            let position = site.position.unwrap_or_else(|| {
                info!(site = %site.name, "no coordinates; using the serial site pin");
                SERIAL_SITE_POSITION
            });
            if !position.in_france() {
                warn!(
                    site = %site.name,
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "outside France; not placed on the map"
                );
                return None;
            }
            Some(Marker {
                name: &site.name,
                region: &site.region,
                year: site.year,
                kind: site.kind,
                color: kind_color(site.kind),
                lat: position.latitude,
                lon: position.longitude,
            })
        })
        .collect()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// JSON that is safe to inline in a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn count_by_kind(sites: &[HeritageSite]) -> HashMap<SiteKind, usize> {
    let mut counts = HashMap::new();
    for site in sites {
        *counts.entry(site.kind).or_insert(0) += 1;
    }
    counts
}

pub fn render_map(sites: &[HeritageSite]) -> Result<String> {
    let markers = markers(sites);
    let counts = count_by_kind(sites);
    let mut legend = String::new();
    for kind in SiteKind::ALL {
        writeln!(
            legend,
            r#"      <div class="row"><span class="dot" style="background:{}"></span>{} ({})</div>"#,
            kind_color(kind),
            kind.label(),
            counts.get(&kind).copied().unwrap_or(0)
        )?;
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Sites UNESCO de France - carte</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <style>
    html, body, #map {{ height: 100%; margin: 0; }}
    .legend {{ position: fixed; top: 10px; right: 10px; z-index: 1000; width: 200px;
      background: white; border: 2px solid #ddd; border-radius: 10px; padding: 15px;
      font-family: 'Segoe UI', Tahoma, sans-serif; font-size: 14px;
      box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); }}
    .legend h4 {{ margin: 0 0 12px 0; color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 8px; }}
    .legend .row {{ margin: 8px 0; color: #555; }}
    .legend .dot {{ display: inline-block; width: 12px; height: 12px; border-radius: 50%; margin-right: 8px; }}
    .legend .total {{ text-align: center; color: #7f8c8d; font-size: 12px; border-top: 1px solid #ddd; padding-top: 10px; }}
    .popup h4 {{ margin: 0 0 8px 0; padding-bottom: 4px; border-bottom: 2px solid; }}
    .popup p {{ margin: 4px 0; color: #555; font-size: 13px; }}
  </style>
</head>
<body>
  <div id="map"></div>
  <div class="legend">
    <h4>Légende</h4>
{legend}    <div class="total"><strong>Total : {total} sites</strong></div>
  </div>
  <script>
    const SITES = {data};
    const map = L.map('map').setView([{lat}, {lon}], {zoom});
    L.tileLayer('https://{{s}}.basemaps.cartocdn.com/light_all/{{z}}/{{x}}/{{y}}{{r}}.png', {{
      attribution: '&copy; OpenStreetMap contributors &copy; CARTO',
      maxZoom: 19
    }}).addTo(map);
    function line(label, value) {{
      const p = document.createElement('p');
      const strong = document.createElement('strong');
      strong.textContent = label + ' ';
      p.append(strong, value === null ? 'N/A' : String(value));
      return p;
    }}
    for (const site of SITES) {{
      const popup = document.createElement('div');
      popup.className = 'popup';
      const title = document.createElement('h4');
      title.textContent = site.name;
      title.style.color = site.color;
      title.style.borderColor = site.color;
      popup.append(title, line('Région :', site.region), line('Type :', site.kind),
        line('Inscrit en :', site.year));
      L.circleMarker([site.lat, site.lon], {{
        radius: 8, color: site.color, fillColor: site.color, fillOpacity: 0.85, weight: 2
      }}).bindPopup(popup, {{ maxWidth: 300 }}).addTo(map);
    }}
  </script>
</body>
</html>
"#,
        legend = legend,
        total = markers.len(),
        data = script_json(&markers)?,
        lat = MAP_CENTER.latitude,
        lon = MAP_CENTER.longitude,
        zoom = MAP_ZOOM,
    ))
}

/// Counts behind the statistics page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteStats {
    /// Most represented regions first, ties in name order.
    pub regions: Vec<(String, usize)>,
    pub decades: BTreeMap<u16, usize>,
    pub kinds: Vec<(SiteKind, usize)>,
    pub total: usize,
    pub located: usize,
}

impl SiteStats {
    pub fn from_sites(sites: &[HeritageSite]) -> Self {
        let mut regions: HashMap<&str, usize> = HashMap::new();
        let mut decades = BTreeMap::new();
        for site in sites {
            *regions.entry(site.region.as_str()).or_insert(0) += 1;
            if let Some(year) = site.year {
                *decades.entry(year / 10 * 10).or_insert(0) += 1;
            }
        }
        let mut regions: Vec<(String, usize)> = regions
            .into_iter()
            .map(|(region, count)| (region.to_string(), count))
            .collect();
        regions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        regions.truncate(TOP_REGIONS);

        let counts = count_by_kind(sites);
        let kinds = SiteKind::ALL
            .iter()
            .map(|kind| (*kind, counts.get(kind).copied().unwrap_or(0)))
            .collect();

        Self {
            regions,
            decades,
            kinds,
            total: sites.len(),
            located: sites.iter().filter(|site| site.position.is_some()).count(),
        }
    }
}

fn bar_chart(out: &mut String, title: &str, color: &str, rows: &[(String, usize)]) -> Result<()> {
    let max = rows.iter().map(|(_, count)| *count).max().unwrap_or(0).max(1);
    writeln!(out, "  <section>\n    <h2>{}</h2>", escape_html(title))?;
    for (label, count) in rows {
        let percent = *count as f64 * 100.0 / max as f64;
        writeln!(
            out,
            r#"    <div class="bar"><span class="label">{}</span><span class="fill" style="width:{percent:.1}%;background:{color}"></span><span class="count">{count}</span></div>"#,
            escape_html(label)
        )?;
    }
    writeln!(out, "  </section>")?;
    Ok(())
}

pub fn render_stats(stats: &SiteStats) -> Result<String> {
    let mut body = String::new();
    bar_chart(
        &mut body,
        "Top 10 des régions",
        "#2E86AB",
        &stats.regions,
    )?;
    let decades: Vec<(String, usize)> = stats
        .decades
        .iter()
        .map(|(decade, count)| (format!("{decade}s"), *count))
        .collect();
    bar_chart(&mut body, "Inscriptions par décennie", "#A23B72", &decades)?;
    let kinds: Vec<(String, usize)> = stats
        .kinds
        .iter()
        .map(|(kind, count)| (kind.label().to_string(), *count))
        .collect();
    bar_chart(&mut body, "Répartition par type", "#F18F01", &kinds)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="utf-8">
  <title>Sites UNESCO de France - statistiques</title>
  <style>
    body {{ font-family: system-ui, sans-serif; background: #0b0b12; color: white; margin: 40px auto; max-width: 900px; }}
    section {{ margin-bottom: 48px; }}
    .bar {{ display: flex; align-items: center; gap: 12px; margin: 6px 0; }}
    .label {{ width: 260px; text-align: right; color: #ccc; }}
    .fill {{ height: 18px; border-radius: 9px; }}
    .count {{ color: #999; }}
  </style>
</head>
<body>
  <h1>Sites UNESCO de France</h1>
  <p>{total} sites, dont {located} géolocalisés, dans {regions} régions.</p>
{body}</body>
</html>
"#,
        total = stats.total,
        located = stats.located,
        regions = stats.regions.len(),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPages {
    pub map: PathBuf,
    pub stats: PathBuf,
    pub data: PathBuf,
}

fn write_file(path: PathBuf, contents: &str) -> Result<PathBuf> {
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Writes the map, the statistics page and the raw data into `dir`.
pub fn publish(dir: &Path, sites: &[HeritageSite]) -> Result<PublishedPages> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let stats = SiteStats::from_sites(sites);
    let pages = PublishedPages {
        map: write_file(dir.join(MAP_PAGE), &render_map(sites)?)?,
        stats: write_file(dir.join(STATS_PAGE), &render_stats(&stats)?)?,
        data: write_file(dir.join(DATA_FILE), &serde_json::to_string_pretty(sites)?)?,
    };
    info!(
        dir = %dir.display(),
        sites = stats.total,
        located = stats.located,
        "site pages written"
    );
    Ok(pages)
}
