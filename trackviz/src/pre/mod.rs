pub mod catalog;
pub mod image_resolver;
pub mod read_viewer_config;
pub mod viewer_opts;
