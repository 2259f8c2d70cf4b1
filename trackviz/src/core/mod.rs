pub mod animation;
pub mod camera;
pub mod circuit;
pub mod renderer;
pub mod style;
pub mod surface;
pub mod transform;
