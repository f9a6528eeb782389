/// Command Line Interface for svnconf
/// (c) 2024 Ross Younger
mod args;
mod cli_main;
pub use cli_main::cli;
