pub mod api;
pub mod app;
pub mod builder;
pub mod config;
pub mod errors;
mod files;
pub mod hash;
pub mod logging;
pub mod manifest;
pub mod prerequisites;
pub mod project_config;
pub mod resolver;
pub mod runner;
