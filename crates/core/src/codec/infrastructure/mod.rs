pub mod ffmpeg_backend;
pub mod ffmpeg_container;
pub mod ffmpeg_encoder_config;
pub mod ffmpeg_frames;
pub mod ffmpeg_mapping;
pub mod ffmpeg_pixel_converter;
