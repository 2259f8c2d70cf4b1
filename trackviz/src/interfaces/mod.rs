pub mod loader_interface;
pub mod view_interface;
