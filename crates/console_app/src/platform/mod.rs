pub mod app;
mod commands;
pub mod logging;
mod persistence;
mod render;
