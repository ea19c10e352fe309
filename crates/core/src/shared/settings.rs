use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::{DEFAULT_EXTENSION, SETTINGS_DIR_NAME, SETTINGS_FILE_NAME};
use super::error::RenderError;
use crate::codec::domain::catalog::CodecCatalog;
use crate::render::domain::persisted_render_config::PersistedRenderConfig;
use crate::render::domain::render_config::RenderConfig;
use crate::render::encoding_engine::EngineSettings;

/// User-level render settings stored as JSON in the platform config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "default_extension")]
    pub default_extension: String,
    /// Caps every render to this many seconds; `None` or 0 renders everything.
    #[serde(default)]
    pub max_render_length_secs: Option<f64>,
    /// Codec tag forced onto the video stream, e.g. `"XVID"`.
    #[serde(default)]
    pub fourcc_override: Option<String>,
    #[serde(default)]
    pub default_render: Option<PersistedRenderConfig>,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            default_extension: default_extension(),
            max_render_length_secs: None,
            fourcc_override: None,
            default_render: None,
        }
    }
}

impl RenderSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| Self::load_from(&path).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("Could not save settings to {}: {e}", path.display());
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, RenderError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn engine_settings(&self) -> Result<EngineSettings, RenderError> {
        let codec_tag = match self.fourcc_override.as_deref() {
            Some(value) if !value.is_empty() => Some(fourcc_tag(value)?),
            _ => None,
        };
        let max_render_length = self.max_render_length_secs.filter(|secs| *secs > 0.0);
        Ok(EngineSettings {
            max_render_length,
            codec_tag,
        })
    }

    /// The process-wide default configuration; falls back to the catalog
    /// default when nothing (or nothing valid) is stored.
    pub fn default_render(&self, catalog: &CodecCatalog) -> RenderConfig {
        self.default_render
            .as_ref()
            .and_then(|persisted| match persisted.restore(catalog) {
                Ok(config) => Some(config),
                Err(e) => {
                    log::warn!("Ignoring stored default render configuration: {e}");
                    None
                }
            })
            .unwrap_or_else(|| RenderConfig::new(catalog.default_format()))
    }

    pub fn set_default_render(&mut self, config: &RenderConfig) {
        self.default_render = Some(PersistedRenderConfig::from_config(
            &config.with_file_name_removed(),
        ));
    }
}

/// Packs 1 to 4 ASCII characters into a little-endian codec tag.
pub fn fourcc_tag(value: &str) -> Result<u32, RenderError> {
    let bytes = value.as_bytes();
    if bytes.is_empty() || bytes.len() > 4 {
        return Err(RenderError::InvalidFourCc {
            value: value.to_string(),
        });
    }
    Ok(bytes
        .iter()
        .enumerate()
        .fold(0u32, |tag, (i, b)| tag | (u32::from(*b) << (8 * i))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fourcc_packs_little_endian() {
        assert_eq!(fourcc_tag("XVID").unwrap(), u32::from_le_bytes(*b"XVID"));
        assert_eq!(fourcc_tag("A").unwrap(), 0x41);
        assert_eq!(fourcc_tag("AB").unwrap(), 0x4241);
    }

    #[test]
    fn test_fourcc_rejects_bad_lengths() {
        assert!(matches!(
            fourcc_tag(""),
            Err(RenderError::InvalidFourCc { .. })
        ));
        assert!(fourcc_tag("DIVX5").is_err());
    }

    #[test]
    fn test_engine_settings_ignores_zero_length_and_empty_tag() {
        let settings = RenderSettings {
            max_render_length_secs: Some(0.0),
            fourcc_override: Some(String::new()),
            ..Default::default()
        };
        let engine = settings.engine_settings().unwrap();
        assert_eq!(engine.max_render_length, None);
        assert_eq!(engine.codec_tag, None);
    }

    #[test]
    fn test_engine_settings_carries_overrides() {
        let settings = RenderSettings {
            max_render_length_secs: Some(2.5),
            fourcc_override: Some("XVID".to_string()),
            ..Default::default()
        };
        let engine = settings.engine_settings().unwrap();
        assert_eq!(engine.max_render_length, Some(2.5));
        assert_eq!(engine.codec_tag, Some(u32::from_le_bytes(*b"XVID")));
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let catalog = CodecCatalog::standard();
        let mut settings = RenderSettings {
            fourcc_override: Some("XVID".to_string()),
            ..Default::default()
        };
        let mut config = RenderConfig::new(catalog.format("matroska").unwrap());
        config.set_separate_at_cuts(true);
        settings.set_default_render(&config);
        settings.save_to(&path).unwrap();

        let loaded = RenderSettings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.default_render(&catalog), config);
    }

    #[test]
    fn test_default_render_drops_only_the_file_name() {
        let catalog = CodecCatalog::standard();
        let mut config = RenderConfig::new(catalog.default_format());
        config.set_output_file(std::path::PathBuf::from("/renders/trailer.mkv"), &catalog);
        let mut settings = RenderSettings::default();
        settings.set_default_render(&config);

        let default = settings.default_render(&catalog);

        assert!(default.output_file().is_none());
        assert_eq!(default.output_directory(), Some(Path::new("/renders")));
        assert_eq!(default.output_extension(), Some("mkv"));
        assert!(config.is_default(&default));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{}").unwrap();
        let loaded = RenderSettings::load_from(&path).unwrap();
        assert_eq!(loaded, RenderSettings::default());
        assert_eq!(loaded.default_extension, "avi");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            RenderSettings::load_from(&path),
            Err(RenderError::Settings(_))
        ));
    }

    #[test]
    fn test_default_render_falls_back_to_catalog_default() {
        let catalog = CodecCatalog::standard();
        let config = RenderSettings::default().default_render(&catalog);
        assert_eq!(config.format().short_name(), "avi");
        assert!(config.output_file().is_none());
    }
}
