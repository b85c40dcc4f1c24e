//! Site-wide settings for the editing panel.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("sidebar_width must be between 30 and 40, got {0}")]
    SidebarWidth(u8),

    #[error("full_width must be between 50 and 95, got {0}")]
    FullWidth(u8),
}

/// Settings for the editing UI, loaded from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bundles enabled for in-context editing, keyed by entity type. An
    /// empty map enables everything (the demo default).
    pub enabled_bundles: BTreeMap<String, BTreeSet<String>>,

    /// Width of the editing sidebar when it opens, percent of the viewport.
    pub sidebar_width: u8,

    /// Width of the sidebar when expanded, percent of the viewport.
    pub full_width: u8,

    /// Update page content via AJAX after editing instead of reloading.
    pub ajax_content_update: bool,

    /// `entity_type.bundle.field_name` entries that must not get the AJAX
    /// update wrapper markup.
    pub exclude_fields: BTreeSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled_bundles: BTreeMap::new(),
            sidebar_width: 30,
            full_width: 70,
            ajax_content_update: true,
            exclude_fields: BTreeSet::new(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(30..=40).contains(&self.sidebar_width) {
            return Err(SettingsError::SidebarWidth(self.sidebar_width));
        }
        if !(50..=95).contains(&self.full_width) {
            return Err(SettingsError::FullWidth(self.full_width));
        }
        Ok(())
    }

    /// Whether in-context editing is enabled for an entity bundle.
    pub fn is_enabled(&self, entity_type: &str, bundle: &str) -> bool {
        if self.enabled_bundles.is_empty() {
            return true;
        }
        self.enabled_bundles
            .get(entity_type)
            .map(|bundles| bundles.contains(bundle))
            .unwrap_or(false)
    }

    /// Whether a field is excluded from AJAX content update wrappers.
    pub fn is_field_excluded(&self, entity_type: &str, bundle: &str, field: &str) -> bool {
        self.exclude_fields
            .contains(&format!("{}.{}.{}", entity_type, bundle, field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_widths_are_rejected() {
        let settings = Settings {
            sidebar_width: 20,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::SidebarWidth(20))
        ));

        let settings = Settings {
            full_width: 96,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::FullWidth(96))
        ));
    }

    #[test]
    fn empty_bundle_map_enables_everything() {
        let settings = Settings::default();
        assert!(settings.is_enabled("node", "page"));

        let mut restricted = Settings::default();
        restricted
            .enabled_bundles
            .insert("node".to_string(), ["blog_post".to_string()].into());
        assert!(restricted.is_enabled("node", "blog_post"));
        assert!(!restricted.is_enabled("node", "page"));
        assert!(!restricted.is_enabled("block", "sidebar"));
    }

    #[test]
    fn excluded_fields_match_full_paths() {
        let mut settings = Settings::default();
        settings
            .exclude_fields
            .insert("node.page.field_content".to_string());
        assert!(settings.is_field_excluded("node", "page", "field_content"));
        assert!(!settings.is_field_excluded("node", "blog_post", "field_content"));
    }

    #[test]
    fn loads_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sidebar_width": 35, "full_width": 80, "ajax_content_update": false}}"#
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.sidebar_width, 35);
        assert_eq!(settings.full_width, 80);
        assert!(!settings.ajax_content_update);
    }
}
