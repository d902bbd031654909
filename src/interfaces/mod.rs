//! Outer adapters: CSV input and output, and the command-script replay used
//! by the binary.

pub mod csv;
pub mod script;
