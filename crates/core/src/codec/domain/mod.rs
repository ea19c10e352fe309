pub mod capability;
pub mod catalog;
pub mod codec;
pub mod codec_backend;
pub mod encoder_config;
pub mod format_negotiation;
pub mod output_format;
pub mod parameter;
