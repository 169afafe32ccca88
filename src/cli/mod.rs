//! Presentation helpers shared by the `lwa` command paths.

pub mod console;
