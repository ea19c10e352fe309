use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::render_config::RenderConfig;
use crate::codec::domain::catalog::CodecCatalog;
use crate::codec::domain::codec::{Codec, CodecId};
use crate::codec::domain::parameter::ParameterId;
use crate::shared::error::RenderError;
use crate::shared::time::Pts;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedParameter {
    pub id: ParameterId,
    pub value: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCodec {
    pub codec: String,
    #[serde(default)]
    pub parameters: Vec<PersistedParameter>,
}

/// Serializable form of a [`RenderConfig`], independent of the catalog's
/// in-memory representation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRenderConfig {
    #[serde(default)]
    pub output_directory: Option<PathBuf>,
    #[serde(default)]
    pub output_name: Option<String>,
    #[serde(default)]
    pub output_extension: Option<String>,
    pub container: String,
    pub video: PersistedCodec,
    pub audio: PersistedCodec,
    #[serde(default)]
    pub separate_at_cuts: bool,
    #[serde(default)]
    pub range: Option<(Pts, Pts)>,
}

impl PersistedCodec {
    fn from_codec(codec: &Codec) -> Self {
        Self {
            codec: codec.id().short_name().to_string(),
            parameters: codec
                .parameters()
                .iter()
                .map(|p| PersistedParameter {
                    id: p.id(),
                    value: p.value(),
                })
                .collect(),
        }
    }

    fn restore(&self, lookup: impl Fn(CodecId) -> Option<Codec>) -> Result<Codec, RenderError> {
        let unknown = || RenderError::UnknownCodec {
            name: self.codec.clone(),
        };
        let id = CodecId::from_short_name(&self.codec).ok_or_else(unknown)?;
        let mut codec = lookup(id).ok_or_else(unknown)?;
        for parameter in &self.parameters {
            codec.set_parameter_value(parameter.id, parameter.value)?;
        }
        Ok(codec)
    }
}

impl PersistedRenderConfig {
    pub fn from_config(config: &RenderConfig) -> Self {
        let format = config.format();
        Self {
            output_directory: config.output_directory().map(|p| p.to_path_buf()),
            output_name: config.output_name().map(str::to_string),
            output_extension: config.output_extension().map(str::to_string),
            container: format.short_name().to_string(),
            video: PersistedCodec::from_codec(format.video_codec()),
            audio: PersistedCodec::from_codec(format.audio_codec()),
            separate_at_cuts: config.separate_at_cuts(),
            range: config.range().map(|r| (r.start, r.end)),
        }
    }

    /// Rebuilds the configuration through the catalog; unknown names and
    /// out-of-range values are rejected.
    pub fn restore(&self, catalog: &CodecCatalog) -> Result<RenderConfig, RenderError> {
        let mut format = catalog
            .format(&self.container)
            .ok_or_else(|| RenderError::UnknownContainer {
                name: self.container.clone(),
            })?;
        format.set_video_codec(self.video.restore(|id| catalog.video_codec(id))?);
        format.set_audio_codec(self.audio.restore(|id| catalog.audio_codec(id))?);

        let mut config = RenderConfig::new(format);
        config.replace_output_parts(
            self.output_directory.clone(),
            self.output_name.clone(),
            self.output_extension.clone(),
        );
        config.set_separate_at_cuts(self.separate_at_cuts);
        if let Some((start, end)) = self.range {
            if start < 0 || end <= start {
                return Err(RenderError::InvalidProperties {
                    message: format!("render range [{start}, {end}) is empty"),
                });
            }
            config.set_range(Some(start..end));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::domain::codec::MediaKind;

    fn customized(catalog: &CodecCatalog) -> RenderConfig {
        let mut config = RenderConfig::new(catalog.format("mpeg").unwrap());
        config.set_output_file(PathBuf::from("/render/movie.mpg"), catalog);
        config
            .format_mut()
            .video_codec_mut()
            .set_parameter_value(ParameterId::MacroBlockDecision, 0)
            .unwrap();
        config
            .format_mut()
            .set_audio_codec(Codec::none(MediaKind::Audio));
        config.set_separate_at_cuts(true);
        config.set_range(Some(25..250));
        config
    }

    #[test]
    fn test_restore_reproduces_config() {
        let catalog = CodecCatalog::standard();
        let config = customized(&catalog);
        let persisted = PersistedRenderConfig::from_config(&config);
        assert_eq!(persisted.container, "mpeg");
        assert_eq!(persisted.video.codec, "mpeg1video");
        assert_eq!(persisted.audio.codec, "none");
        assert_eq!(persisted.restore(&catalog).unwrap(), config);
    }

    #[test]
    fn test_nameless_config_keeps_directory_and_extension() {
        let catalog = CodecCatalog::standard();
        let stored = customized(&catalog).with_file_name_removed();
        let persisted = PersistedRenderConfig::from_config(&stored);
        assert_eq!(persisted.output_name, None);
        assert_eq!(persisted.output_directory, Some(PathBuf::from("/render")));
        assert_eq!(persisted.output_extension.as_deref(), Some("mpg"));

        let restored = persisted.restore(&catalog).unwrap();
        assert_eq!(restored, stored);
        assert_eq!(restored.output_file(), None);
    }

    #[test]
    fn test_json_shape() {
        let catalog = CodecCatalog::standard();
        let json = serde_json::to_value(PersistedRenderConfig::from_config(&customized(&catalog)))
            .unwrap();
        assert_eq!(json["container"], "mpeg");
        assert_eq!(json["video"]["parameters"][0]["id"], "bit_rate");
        assert_eq!(json["separate_at_cuts"], true);
    }

    #[test]
    fn test_unknown_container_is_rejected() {
        let catalog = CodecCatalog::standard();
        let mut persisted = PersistedRenderConfig::from_config(&customized(&catalog));
        persisted.container = "asf".to_string();
        assert!(matches!(
            persisted.restore(&catalog),
            Err(RenderError::UnknownContainer { .. })
        ));
    }

    #[test]
    fn test_codec_of_wrong_kind_is_rejected() {
        let catalog = CodecCatalog::standard();
        let mut persisted = PersistedRenderConfig::from_config(&customized(&catalog));
        persisted.video.codec = "mp2".to_string();
        assert!(matches!(
            persisted.restore(&catalog),
            Err(RenderError::UnknownCodec { .. })
        ));
    }

    #[test]
    fn test_out_of_range_value_is_rejected() {
        let catalog = CodecCatalog::standard();
        let mut persisted = PersistedRenderConfig::from_config(&customized(&catalog));
        persisted.video.parameters[0].value = 10;
        assert!(matches!(
            persisted.restore(&catalog),
            Err(RenderError::InvalidParameterValue { .. })
        ));
    }

    #[test]
    fn test_missing_optional_fields_take_defaults() {
        let catalog = CodecCatalog::standard();
        let json = r#"{"container":"avi","video":{"codec":"mpeg4"},"audio":{"codec":"mp2"}}"#;
        let persisted: PersistedRenderConfig = serde_json::from_str(json).unwrap();
        let config = persisted.restore(&catalog).unwrap();
        assert_eq!(config, RenderConfig::new(catalog.format("avi").unwrap()));
    }
}
