//! Storefront page configuration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use turbo_hydrate::TriggerSpec;

use crate::error::{IslandError, Result};
use crate::island::IslandKind;

/// Page layout: which islands exist and how each one activates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default)]
    pub storefront: StorefrontSection,

    #[serde(default)]
    pub islands: Vec<IslandConfig>,
}

/// Page metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontSection {
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for StorefrontSection {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

fn default_name() -> String {
    "TurboCommerce Islands".to_string()
}

/// One island on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandConfig {
    /// Unique name; also the mount point and region name.
    pub name: String,

    pub kind: IslandKind,

    /// Activation trigger. Absent means rendered eagerly with the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerSpec>,
}

impl IslandConfig {
    pub fn eager(kind: IslandKind) -> Self {
        Self {
            name: kind.as_str().to_string(),
            kind,
            trigger: None,
        }
    }

    pub fn deferred(kind: IslandKind, trigger: TriggerSpec) -> Self {
        Self {
            name: kind.as_str().to_string(),
            kind,
            trigger: Some(trigger),
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.trigger.is_some()
    }
}

impl StorefrontConfig {
    /// Load a config from a TOML or JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };

        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Parse TOML without validating.
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check names are unique and triggers are well formed.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for island in &self.islands {
            if !seen.insert(island.name.as_str()) {
                return Err(IslandError::DuplicateIsland(island.name.clone()));
            }
            if let Some(trigger) = &island.trigger {
                trigger.validate()?;
            }
        }
        Ok(())
    }

    pub fn island(&self, name: &str) -> Option<&IslandConfig> {
        self.islands.iter().find(|i| i.name == name)
    }

    /// The demo page: a light island in the main bundle, everything else deferred.
    pub fn demo() -> Self {
        Self {
            storefront: StorefrontSection::default(),
            islands: vec![
                IslandConfig::eager(IslandKind::Light),
                IslandConfig::deferred(IslandKind::Heavy, TriggerSpec::interaction()),
                IslandConfig::deferred(IslandKind::Dynamic, TriggerSpec::viewport()),
                IslandConfig::deferred(IslandKind::Cart, TriggerSpec::timer(3000)),
                IslandConfig::deferred(IslandKind::Media, TriggerSpec::viewport()),
                IslandConfig::deferred(IslandKind::Wizard, TriggerSpec::interaction()),
                IslandConfig::deferred(IslandKind::Dashboard, TriggerSpec::timer(2000)),
            ],
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self::demo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turbo_hydrate::{ConfigError, TriggerKind};

    const PAGE: &str = r#"
[storefront]
name = "Camera Shop"

[[islands]]
name = "hero"
kind = "light"

[[islands]]
name = "reviews"
kind = "heavy"
trigger = { kind = "viewport" }

[[islands]]
name = "basket"
kind = "cart"
trigger = { kind = "timer", timer_delay_ms = 1500 }
"#;

    #[test]
    fn test_parse_toml() {
        let config = StorefrontConfig::from_toml(PAGE).unwrap();
        assert_eq!(config.storefront.name, "Camera Shop");
        assert_eq!(config.islands.len(), 3);
        assert!(!config.islands[0].is_deferred());

        let basket = config.island("basket").unwrap();
        assert_eq!(basket.kind, IslandKind::Cart);
        let trigger = basket.trigger.unwrap();
        assert_eq!(trigger.kind, TriggerKind::Timer);
        assert_eq!(trigger.timer_delay_ms, Some(1500));
        config.validate().unwrap();
    }

    #[test]
    fn test_timer_without_delay_is_rejected() {
        let config = StorefrontConfig::from_toml(
            r#"
[[islands]]
name = "basket"
kind = "cart"
trigger = { kind = "timer" }
"#,
        )
        .unwrap();
        assert_eq!(config.storefront.name, "TurboCommerce Islands");
        assert!(matches!(
            config.validate(),
            Err(IslandError::Config(ConfigError::MissingTimerDelay))
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut config = StorefrontConfig::demo();
        config.islands.push(IslandConfig::eager(IslandKind::Light));
        assert!(matches!(
            config.validate(),
            Err(IslandError::DuplicateIsland(name)) if name == "light"
        ));
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let parsed = StorefrontConfig::from_toml(
            r#"
[[islands]]
name = "x"
kind = "carousel"
"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_demo_round_trips_through_toml() {
        let demo = StorefrontConfig::demo();
        demo.validate().unwrap();
        let parsed = StorefrontConfig::from_toml(&demo.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, demo);
    }

    #[test]
    fn test_load_reports_path() {
        let err = StorefrontConfig::load("/nonexistent/storefront.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/storefront.toml"));
    }
}
