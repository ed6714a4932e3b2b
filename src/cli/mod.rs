//! Command-line interface

pub mod commands;
pub mod error;
