//! Shared test infrastructure for the query engine.
//!
//! Provides an in-memory asset catalog, query functions and a field
//! registration source that mirror a small production setup.

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;
