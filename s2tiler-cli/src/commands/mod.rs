//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`cell`] - Cell id inspection (lonlat, inspect)
//! - [`init`] - Configuration initialization
//! - [`stats`] - Tile counts for one or more inputs
//! - [`tile`] - Build an index and print tiles

pub mod cell;
pub mod common;
pub mod init;
pub mod stats;
pub mod tile;
