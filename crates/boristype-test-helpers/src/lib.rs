//! Test utilities and fixtures for BorisType
//!
//! This crate provides shared test helpers for the integration tests of the
//! compiler crates (the `tests/` directories).

pub mod compile;
pub mod fixtures;

pub use compile::{compile, compile_with, lower, lower_with_oracle, strip_helpers};
