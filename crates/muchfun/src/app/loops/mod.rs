pub mod logic;
pub mod render;
