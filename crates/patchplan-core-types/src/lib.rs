//! Core types shared across patchplan facilities
//!
//! This crate holds the vocabulary used by both the engine's logging
//! facility and the command-line front end:
//!
//! - **Schema constants**: Canonical field keys and event names

pub mod schema;
