//! # docreg_app
//!
//! Shared utilities for the document submission binary

pub mod cli;
pub mod config_loader;
pub mod documents;
pub mod shutdown_handler;
pub mod tracing_setup;
