pub mod commands;
pub mod display;
pub mod kind;

pub use commands::CliArgs;
