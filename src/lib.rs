//! Health Transfer - export, import and merge of a personal health database
//!
//! This crate provides the core functionality for the `htx` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`storage`] - SQLite health record store and its schema
//! - [`transfer`] - Export, import, merge and periodic export jobs
//! - [`config`] - Data root resolution, settings and feature flags
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod storage;
pub mod transfer;

pub use error::{Error, Result};
