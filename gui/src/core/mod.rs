pub mod egui_surface;
pub mod gui;
