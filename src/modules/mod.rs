pub mod grid;
pub mod health;
pub mod infinite;
pub mod resources;
