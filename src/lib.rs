pub mod commands;
pub mod config;
pub mod logging;
pub mod project;
pub mod resolve;
pub mod version;
