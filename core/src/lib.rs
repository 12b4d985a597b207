//! Deterministic block layouts and per-event seed derivation for
//! Monte Carlo event workers.
//!
//! The pure core is `block`, `seed`, `rng` and `config`. `blob`, `store`
//! and `action` are the storage and dispatch collaborators built around it.

pub mod action;
pub mod blob;
pub mod block;
pub mod config;
pub mod error;
pub mod rng;
pub mod seed;
pub mod store;
pub mod types;
