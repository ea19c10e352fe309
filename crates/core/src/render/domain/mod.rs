pub mod audio_packer;
pub mod persisted_render_config;
pub mod render_config;
pub mod segmentation;
pub mod timeline_source;
