//! Integration test utilities for the danmaku client
//!
//! This crate provides an in-process broadcast server and event collectors
//! for running end-to-end session tests.

pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
