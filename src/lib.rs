//! Core library for the Voto Safe electronic voting demo: a typed JSON
//! document store plus the eligibility, casting, and statistics operations
//! the console exposes.
//!
//! This is a single-process demo. The store is a directory of JSON files
//! with last-full-write-wins semantics; there is no server, no network
//! protocol, and no real ballot secrecy.

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod model;
pub mod service;

#[cfg(feature = "demo")]
pub mod fixtures;
