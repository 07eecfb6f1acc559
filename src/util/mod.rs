/// Helper functions for read/writing JSON via serde
pub mod json_io;
/// Helper functions for generating the progress spinners
pub mod progress_bar;
