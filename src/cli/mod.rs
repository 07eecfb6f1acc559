/*!
# CLI module
Command line interface functionality that is specific to vafmean.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The aggregate CLI subcommand
pub mod aggregate;
