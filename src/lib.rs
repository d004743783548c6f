//! # ccstatus
//!
//! A status line for Claude Code sessions. Claude Code pipes a JSON session
//! document on stdin; ccstatus fetches data from a set of providers
//! concurrently and renders the configured components into one line.
//!
//! ## Features
//!
//! - `git` (default): repository inspection via gix
//! - `colors` (default): terminal colors via owo-colors

/// Assembly of a status line from configuration
pub mod app;

/// Session-scoped provider cache persisted to disk
pub mod cache;

/// Command-line arguments and help text
pub mod cli;

/// Built-in display segments
pub mod components;

/// Layered YAML configuration
pub mod config;

/// Registry, providers, render context and the orchestrator
pub mod core;

/// Color handling
pub mod display;

/// Git repository inspection
pub mod git;

/// stderr logging setup
pub mod logging;

/// Session payload and provider data types
pub mod models;

/// Subprocess execution with timeouts
pub mod process;

/// Built-in data providers
pub mod providers;

/// minijinja template rendering
pub mod template;

/// OAuth usage endpoint client
pub mod usage_api;

/// Formatting and path helpers
pub mod utils;
