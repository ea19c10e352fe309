pub mod audio_chunk;
pub mod constants;
pub mod error;
pub mod frame;
pub mod media_format;
pub mod render_properties;
pub mod settings;
pub mod time;
