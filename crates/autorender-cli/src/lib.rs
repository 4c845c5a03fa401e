//! Autorender CLI library.
//!
//! This crate provides the command implementations behind the `autorender`
//! binary: manifest validation, rendering and environment checks.

pub mod commands;
pub mod engine;
