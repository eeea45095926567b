//! Core library for the goslice program slicer.
//!
//! This library shrinks a Go program to the code one traced execution
//! actually ran: coverage-driven structural pruning, then an oracle-driven
//! loop that neutralizes unused bindings and deletes dead declarations.

// Allow common complexity warnings - these are intentional design choices
#![allow(
    clippy::type_complexity,
    clippy::too_many_arguments,
    clippy::similar_names,
    clippy::map_unwrap_or,
    clippy::items_after_statements
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

/// Module for loading configuration.
pub mod config;

/// Module containing shared constants and regex patterns.
pub mod constants;

/// Module parsing the zero-count coverage report.
pub mod coverage;

/// Module for Tree-sitter based CST parsing of Go sources.
pub mod cst;

/// Module defining the fatal error type of the pipeline.
pub mod error;

/// Module for byte-range edits and their application.
pub mod fix;

/// Module defining the unused-symbol oracle and its command backend.
pub mod oracle;

/// Module orchestrating the structural pass and the settle loop.
pub mod pipeline;

/// Module converting line/column positions to byte offsets.
pub mod position;

/// Module containing the pruners and the declaration fixer.
pub mod slice;

/// Module containing utility functions.
/// This includes path resolution and display helpers.
pub mod utils;

/// Module defining the entry point logic shared by the binaries.
pub mod entry_point;

/// Module for rich CLI output formatting with colored text and tables.
pub mod output;

/// Module defining the command-line interface arguments and structs.
pub mod cli;
