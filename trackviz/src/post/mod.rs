pub mod png_export;
pub mod recording;
