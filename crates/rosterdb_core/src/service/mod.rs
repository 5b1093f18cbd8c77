//! Use-case services on top of repository contracts.
//!
//! # Invariants
//! - Services never bypass repository validation or persistence contracts.
//! - Services stay storage-agnostic.

pub mod roster_service;
