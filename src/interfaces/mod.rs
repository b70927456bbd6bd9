//! Outer surfaces: the command line client, batch files, and state output.

pub mod batch_file;
pub mod cli;
pub mod state_writer;
