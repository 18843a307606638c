//! Shared test utilities
#![allow(dead_code)]

pub mod forest;

pub use forest::*;
