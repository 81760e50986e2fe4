//! Crate-level tests.
//!
//! - Integration tests (native modules, bytecode contracts and inline calls end to end)
//! - Fuzz tests (random bytes into every decoder)

pub mod fuzz;
pub mod integration;
