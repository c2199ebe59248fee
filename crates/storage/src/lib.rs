//! Storage layer for the tally ledger
//!
//! This crate implements the in-memory reference backend:
//! - Primary table behind a single RwLock (merge atomicity needs one
//!   exclusive critical section)
//! - Version allocation with AtomicU64
//! - Staging areas in a DashMap, sharded per batch
//!
//! The backend implements every capability trait from `tally_core::traits`,
//! so each strategy can be handed the same configured handle.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;

pub use memory::MemoryBackend;
