/*!
# Writers module
Contains the logic for writing the output files for the aggregate command.
*/
/// Generates the per-group VAF table
pub mod vaf_table;
