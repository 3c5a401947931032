//! Command-line front end for the loader

pub mod commands;
pub mod error;
