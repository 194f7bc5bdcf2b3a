//! Front ends driving the playground operations.

pub mod cli;
