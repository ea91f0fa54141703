//! Shared test utilities for the dirsync workspace.
//!
//! This crate provides standardised source/target fixtures so crate test
//! suites do not each rebuild them. It is a dev-dependency only, never
//! published.
//!
//! # Modules
//!
//! - [`tree`]: [`TestTree`] builder with controllable directory mtimes

pub mod tree;

pub use tree::TestTree;
