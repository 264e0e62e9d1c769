pub mod index;
pub mod render;
