pub mod commands;
pub mod index;
pub mod pip;
pub mod runner;
pub mod version;
