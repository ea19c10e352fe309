/// Extension used when a new sequence's render target has none.
pub const DEFAULT_EXTENSION: &str = "avi";

/// Short name of the container new configurations start from.
pub const DEFAULT_CONTAINER: &str = "avi";

/// Samples per channel per audio frame for encoders that accept any frame size (PCM).
pub const FALLBACK_AUDIO_FRAME_SIZE: usize = 1024;

pub const SETTINGS_DIR_NAME: &str = "Vidrender";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Separator between a file stem and its segment number (`name_3.avi`).
pub const SEGMENT_SEPARATOR: char = '_';

pub const DEFAULT_WIDTH: u32 = 720;
pub const DEFAULT_HEIGHT: u32 = 576;
pub const DEFAULT_FRAME_RATE: (i32, i32) = (25, 1);
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_CHANNELS: u16 = 2;
