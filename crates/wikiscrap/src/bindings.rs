//! Maps the on-disk settings onto renderer types.

use anyhow::{Context, Result};
use colorbends::{
    parse_palette, Antialiasing, BackgroundConfig, ColorParseError, GpuPowerPreference,
    RenderPolicy, RendererConfig, TextEngine,
};
use siteconfig::{AntialiasSetting, BackgroundSettings, PowerSetting, SiteConfig, WindowSettings};

use crate::landing;

const FALLBACK_SIZE: (u32, u32) = (1280, 800);

pub fn background_config(settings: &BackgroundSettings) -> Result<BackgroundConfig, ColorParseError> {
    Ok(BackgroundConfig {
        rotation: settings.rotation,
        speed: settings.speed,
        colors: parse_palette(&settings.colors)?,
        transparent: settings.transparent,
        auto_rotate: settings.auto_rotate,
        scale: settings.scale,
        frequency: settings.frequency,
        warp_strength: settings.warp_strength,
        mouse_influence: settings.mouse_influence,
        parallax: settings.parallax,
        noise: settings.noise,
    })
}

pub fn map_antialias(setting: Option<AntialiasSetting>) -> Antialiasing {
    match setting {
        None | Some(AntialiasSetting::Off) => Antialiasing::Off,
        Some(AntialiasSetting::Auto) => Antialiasing::Auto,
        Some(AntialiasSetting::Samples2) => Antialiasing::Samples(2),
        Some(AntialiasSetting::Samples4) => Antialiasing::Samples(4),
        Some(AntialiasSetting::Samples8) => Antialiasing::Samples(8),
        Some(AntialiasSetting::Samples16) => Antialiasing::Samples(16),
    }
}

pub fn map_power(setting: PowerSetting) -> GpuPowerPreference {
    match setting {
        PowerSetting::Low => GpuPowerPreference::Low,
        PowerSetting::High => GpuPowerPreference::High,
    }
}

/// A still timestamp wins over the frame cap; `fps = 0` means uncapped.
pub fn render_policy(window: &WindowSettings, still_time: Option<f32>) -> RenderPolicy {
    if let Some(time) = still_time {
        return RenderPolicy::Still { time };
    }
    RenderPolicy::Animate {
        target_fps: window.fps.filter(|fps| *fps > 0.0),
    }
}

/// The layout and the window share `text`, so labels are measured with the
/// faces that draw them.
pub fn renderer_config(
    config: &SiteConfig,
    text: &TextEngine,
    still_time: Option<f32>,
) -> Result<RendererConfig> {
    let background = background_config(&config.background)
        .context("invalid colour in [background].colors")?;
    let surface_size = config
        .window
        .dimensions()
        .context("invalid [window].size")?
        .unwrap_or(FALLBACK_SIZE);

    Ok(RendererConfig {
        surface_size,
        title: config.page.title.clone(),
        fullscreen: config.window.fullscreen,
        antialiasing: map_antialias(config.window.antialias),
        power: map_power(config.window.power),
        policy: render_policy(&config.window, still_time),
        background,
        overlay: Some(landing::overlay_layout(config.page.clone(), text.clone())),
        text: Some(text.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_defaults_map_to_three_colours() {
        let config = background_config(&BackgroundSettings::default()).unwrap();
        assert_eq!(config.colors.len(), 3);
        assert_eq!(config.colors[0].to_array(), [1.0, 0.0, 0.0]);
        assert_eq!(config.colors[2].to_array(), [0.0, 0.0, 1.0]);
        assert!(!config.transparent);
        assert_eq!(config.rotation, 45.0);
    }

    #[test]
    fn malformed_colour_is_reported() {
        let settings = BackgroundSettings {
            colors: vec!["#ff0000".into(), "#12345".into()],
            ..BackgroundSettings::default()
        };
        assert!(matches!(
            background_config(&settings),
            Err(ColorParseError::Length(_))
        ));

        let config = SiteConfig {
            background: settings,
            ..SiteConfig::default()
        };
        assert!(renderer_config(&config, &TextEngine::new(), None).is_err());
    }

    #[test]
    fn still_time_overrides_frame_cap() {
        let window = WindowSettings {
            fps: Some(30.0),
            ..WindowSettings::default()
        };
        assert_eq!(
            render_policy(&window, Some(2.5)),
            RenderPolicy::Still { time: 2.5 }
        );
        assert_eq!(
            render_policy(&window, None),
            RenderPolicy::Animate {
                target_fps: Some(30.0)
            }
        );

        let uncapped = WindowSettings {
            fps: Some(0.0),
            ..WindowSettings::default()
        };
        assert_eq!(
            render_policy(&uncapped, None),
            RenderPolicy::Animate { target_fps: None }
        );
    }

    #[test]
    fn maps_window_settings() {
        assert_eq!(map_antialias(None), Antialiasing::Off);
        assert_eq!(
            map_antialias(Some(AntialiasSetting::Samples4)),
            Antialiasing::Samples(4)
        );
        assert_eq!(map_power(PowerSetting::High), GpuPowerPreference::High);

        let mut config = SiteConfig::default();
        config.window.size = Some("800x600".into());
        let renderer = renderer_config(&config, &TextEngine::new(), None).unwrap();
        assert_eq!(renderer.surface_size, (800, 600));
        assert_eq!(renderer.title, "WikiScrap UNESCO");
        assert!(renderer.overlay.is_some());
        assert!(renderer.text.is_some());
    }
}
