pub mod codec;
pub mod render;
pub mod shared;
