/// Whether a codec can be stored in a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecSupport {
    Unsupported,
    /// The backend cannot prove support either way; requires operator opt-in.
    Uncertain,
    Supported,
}

impl CodecSupport {
    /// Maps a backend compatibility query result: 0 is unsupported, a
    /// negative value is unknown, a positive value is supported.
    pub fn from_query_result(result: i32) -> Self {
        match result {
            0 => Self::Unsupported,
            r if r < 0 => Self::Uncertain,
            _ => Self::Supported,
        }
    }
}

impl std::fmt::Display for CodecSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecSupport::Unsupported => write!(f, "unsupported"),
            CodecSupport::Uncertain => write!(f, "uncertain"),
            CodecSupport::Supported => write!(f, "supported"),
        }
    }
}
