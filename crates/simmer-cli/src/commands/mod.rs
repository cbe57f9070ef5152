pub mod catalog;
pub mod completions;
pub mod config;
pub mod cook;
pub mod session;
pub mod work;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;
