pub mod buffer;
pub mod general;
pub mod geometry;
