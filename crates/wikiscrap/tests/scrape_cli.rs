use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

const SAVED_LIST: &str = r##"<!DOCTYPE html>
<html><body>
<table class="wikitable"><tr><th>Résumé</th></tr></table>
<table class="wikitable sortable">
  <tr><th>Site</th><th>Région</th><th>Année</th><th>Critères</th><th>Type</th><th>Coordonnées</th></tr>
  <tr>
    <td>Cathédrale de Chartres</td><td>Centre-Val de Loire</td><td>1979</td><td>(i)(ii)(iv)</td>
    <td>Culturel</td><td><a class="external text" href="#">48° 26′ 50″ N, 1° 29′ 15″ E</a></td>
  </tr>
  <tr>
    <td>Lagons de Nouvelle-Calédonie</td><td>Nouvelle-Calédonie</td><td>2008</td><td>(vii)(ix)(x)</td>
    <td>Naturel</td><td>-22.0, 166.0</td>
  </tr>
</table>
</body></html>"##;

fn wikiscrap(config_dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_wikiscrap"));
    command.env("WIKISCRAP_CONFIG_DIR", config_dir);
    command.env("RUST_LOG", "warn");
    command
}

#[test]
fn scrape_writes_map_into_output_dir() {
    let root = TempDir::new().unwrap();
    let input = root.path().join("liste.html");
    fs::write(&input, SAVED_LIST).unwrap();
    let out = root.path().join("site");

    let output = wikiscrap(&root.path().join("config"))
        .arg("scrape")
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .output()
        .expect("failed to run wikiscrap scrape");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8(output.stdout).unwrap().contains("Scraped 2 sites"));

    let map = fs::read_to_string(out.join("carte_unesco_france.html")).unwrap();
    assert!(map.contains("Cathédrale de Chartres"));
    assert!(map.contains("Lagons de Nouvelle-Calédonie"));
    assert!(map.contains("Total : 2 sites"));
    assert!(out.join("statistiques_unesco.html").exists());
    assert!(out.join("sites_unesco.json").exists());
}

#[test]
fn scrape_defaults_to_the_local_site_root() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    let site_dir = root.path().join("public");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("wikiscrap.toml"),
        format!("[site]\nroot = {:?}\n", site_dir.display().to_string()),
    )
    .unwrap();
    let input = root.path().join("liste.html");
    fs::write(&input, SAVED_LIST).unwrap();

    let status = wikiscrap(&config_dir)
        .arg("scrape")
        .arg("--input")
        .arg(&input)
        .status()
        .expect("failed to run wikiscrap scrape");
    assert!(status.success());
    assert!(site_dir.join("carte_unesco_france.html").exists());
}

#[test]
fn scrape_rejects_pages_without_the_site_table() {
    let root = TempDir::new().unwrap();
    let input = root.path().join("vide.html");
    fs::write(&input, "<html><body><p>rien</p></body></html>").unwrap();

    let status = wikiscrap(&root.path().join("config"))
        .arg("scrape")
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(root.path().join("site"))
        .status()
        .expect("failed to run wikiscrap scrape");
    assert!(!status.success());
}
