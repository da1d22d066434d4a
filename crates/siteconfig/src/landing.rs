//! Landing page copy and call-to-action buttons.
//!
//! The defaults reproduce the published page: the "WikiScrap UNESCO" brand
//! pill, the two-line headline, and three buttons of which the first two
//! navigate to sibling pages and the last one is inert.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PageSettings {
    /// Window title.
    pub title: String,
    /// Label shown in the navigation pill.
    pub brand: String,
    pub headline: Vec<String>,
    pub actions: Vec<ActionSettings>,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            title: "WikiScrap UNESCO".into(),
            brand: "WikiScrap UNESCO".into(),
            headline: vec!["Sites UNESCO".into(), "de France".into()],
            actions: vec![
                ActionSettings {
                    label: "Commencer".into(),
                    href: Some("./carte_unesco_france.html".into()),
                    style: ButtonStyle::Primary,
                    icon: Some("arrow-right".into()),
                },
                ActionSettings {
                    label: "Consulter le code".into(),
                    href: Some("./code.html".into()),
                    style: ButtonStyle::Accent,
                    icon: Some("code".into()),
                },
                ActionSettings {
                    label: "Rapport collectif".into(),
                    href: None,
                    style: ButtonStyle::Muted,
                    icon: Some("file-alt".into()),
                },
            ],
        }
    }
}

impl PageSettings {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (index, action) in self.actions.iter().enumerate() {
            if action.label.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "page.actions[{index}] must have a label"
                )));
            }
            if let Some(href) = &action.href {
                if href.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "page.actions[{index}] ('{}') has an empty href",
                        action.label
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One call-to-action button.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActionSettings {
    pub label: String,
    /// Relative or absolute target; buttons without one do nothing when clicked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default)]
    pub style: ButtonStyle,
    /// Icon name; only its presence affects layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    /// Solid white pill with a glow.
    Primary,
    /// Translucent blue pill with a blue border.
    Accent,
    /// Dark translucent pill with a faint white border.
    #[default]
    Muted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SiteConfig;

    #[test]
    fn default_page_links_to_sibling_pages() {
        let page = PageSettings::default();
        let hrefs: Vec<_> = page.actions.iter().map(|a| a.href.as_deref()).collect();
        assert_eq!(
            hrefs,
            vec![
                Some("./carte_unesco_france.html"),
                Some("./code.html"),
                None
            ]
        );
        assert_eq!(page.headline, vec!["Sites UNESCO", "de France"]);
    }

    #[test]
    fn action_style_defaults_to_muted() {
        let config = SiteConfig::from_toml_str(
            r#"
[[page.actions]]
label = "Plain"
"#,
        )
        .unwrap();
        assert_eq!(config.page.actions[0].style, ButtonStyle::Muted);
        assert!(config.page.actions[0].href.is_none());
    }

    #[test]
    fn rejects_blank_labels() {
        let err = SiteConfig::from_toml_str(
            r#"
[[page.actions]]
label = "  "
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_blank_href() {
        let err = SiteConfig::from_toml_str(
            r#"
[[page.actions]]
label = "Go"
href = ""
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("Go")));
    }
}
