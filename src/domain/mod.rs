pub mod food;
pub mod grid;
pub mod snake;
