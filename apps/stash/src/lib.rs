//! # Stash
//!
//! HTTP API, CLI and configuration around [`stash_core`].

pub mod api;
pub mod cli;
pub mod config;
