//! Core types for Cairn — membership records and configuration.
//!
//! This crate is the leaf of the workspace: no async runtime, no I/O
//! beyond config file loading.

pub mod config;
pub mod peer;
