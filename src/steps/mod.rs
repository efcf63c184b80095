//! Type-safe installer argument modules.
//!
//! This module contains structs that implement `InstallerArgs` for each
//! install step. Each struct maps Rust fields to the exact CLI flags the
//! package installer expects.

pub mod pip;
