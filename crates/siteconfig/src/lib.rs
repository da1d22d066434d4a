//! On-disk configuration for the WikiScrap landing page.
//!
//! The file is plain TOML with four optional tables:
//!
//! - `[background]` carries the ColorBends knobs (colours as hex strings, the
//!   rotation/speed/warp parameters, transparency).
//! - `[window]` selects the initial size, frame cap, anti-aliasing and reload
//!   cadence of the native window.
//! - `[site]` describes where the sibling static pages live so call-to-action
//!   buttons can be resolved to something the system opener understands.
//! - `[page]` holds the landing page copy and its buttons (see [`landing`]).
//!
//! Every table falls back to the values the shipped landing page uses, so an
//! empty file (or no file at all) reproduces the stock page.

pub mod landing;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub use landing::{ActionSettings, ButtonStyle, PageSettings};

/// Only schema version currently understood.
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub background: BackgroundSettings,
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub page: PageSettings,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            background: BackgroundSettings::default(),
            window: WindowSettings::default(),
            site: SiteSettings::default(),
            page: PageSettings::default(),
        }
    }
}

/// ColorBends knobs as they appear in the file.
///
/// Angles are in degrees, `auto_rotate` in degrees per second. Colours stay
/// strings here; the renderer owns hex parsing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackgroundSettings {
    pub colors: Vec<String>,
    pub rotation: f32,
    pub speed: f32,
    pub transparent: bool,
    pub auto_rotate: f32,
    pub scale: f32,
    pub frequency: f32,
    pub warp_strength: f32,
    pub mouse_influence: f32,
    pub parallax: f32,
    pub noise: f32,
}

impl Default for BackgroundSettings {
    /// Matches the landing page: three primaries over an opaque black page.
    fn default() -> Self {
        Self {
            colors: vec!["#ff0000".into(), "#00ff00".into(), "#0000ff".into()],
            rotation: 45.0,
            speed: 0.2,
            transparent: false,
            auto_rotate: 0.0,
            scale: 1.0,
            frequency: 1.0,
            warp_strength: 1.0,
            mouse_influence: 1.0,
            parallax: 0.5,
            noise: 0.1,
        }
    }
}

impl BackgroundSettings {
    fn numeric_fields(&self) -> [(&'static str, f32); 9] {
        [
            ("rotation", self.rotation),
            ("speed", self.speed),
            ("auto_rotate", self.auto_rotate),
            ("scale", self.scale),
            ("frequency", self.frequency),
            ("warp_strength", self.warp_strength),
            ("mouse_influence", self.mouse_influence),
            ("parallax", self.parallax),
            ("noise", self.noise),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    #[default]
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Initial inner size as `WIDTHxHEIGHT`.
    pub size: Option<String>,
    pub fullscreen: bool,
    /// Frame cap; `0` or absent renders every vblank.
    pub fps: Option<f32>,
    #[serde(
        deserialize_with = "deserialize_antialias_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub antialias: Option<AntialiasSetting>,
    pub power: PowerSetting,
    /// Quiet period after the last change to the config file before it is
    /// reloaded. Editors that save in several steps trigger one reload.
    #[serde(
        alias = "reload_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub reload_debounce: Duration,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            size: None,
            fullscreen: false,
            fps: None,
            antialias: None,
            power: PowerSetting::default(),
            reload_debounce: default_reload_debounce(),
        }
    }
}

impl WindowSettings {
    /// Parses [`WindowSettings::size`] into physical dimensions.
    pub fn dimensions(&self) -> Result<Option<(u32, u32)>, ConfigError> {
        self.size
            .as_deref()
            .map(|raw| parse_dimensions(raw).map_err(ConfigError::Invalid))
            .transpose()
    }
}

/// Where call-to-action targets are resolved.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Directory or `http(s)://` URL that holds the sibling pages. When unset
    /// the page set is expected next to the configuration file.
    pub root: Option<String>,
    /// Public base path of the built site.
    pub base_path: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            root: None,
            base_path: "/wikiscrap/".into(),
        }
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_reload_debounce() -> Duration {
    Duration::from_millis(500)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() || v.is_infinite() {
                return Err(E::custom("duration must be a finite, non-negative number"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    let result = match helper {
        None => None,
        Some(Helper::Str(raw)) => Some(parse_antialias(&raw).map_err(de::Error::custom)?),
        Some(Helper::Num(value)) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            let raw = value.to_string();
            Some(parse_antialias(&raw).map_err(de::Error::custom)?)
        }
    };
    Ok(result)
}

/// Accepts `auto`, `off`, or an MSAA sample count.
pub fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

/// Parses `WIDTHxHEIGHT` (either `x` or `X`), rejecting zero extents.
pub fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err("dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

impl SiteConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SiteConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Like [`SiteConfig::load`] but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no configuration file; using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let serialized = self.to_toml_string()?;
        fs::write(path, serialized).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        for (name, value) in self.background.numeric_fields() {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "background.{name} must be a finite number"
                )));
            }
        }

        for color in &self.background.colors {
            if color.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "background.colors may not contain empty entries".into(),
                ));
            }
        }

        if let Some(fps) = self.window.fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(ConfigError::Invalid("window.fps must be >= 0".into()));
            }
        }

        self.window.dimensions()?;

        if let Some(root) = &self.site.root {
            if root.trim().is_empty() {
                return Err(ConfigError::Invalid("site.root may not be empty".into()));
            }
        }

        if !self.site.base_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "site.base_path '{}' must start with '/'",
                self.site.base_path
            )));
        }

        self.page.validate()?;
        Ok(())
    }
}
