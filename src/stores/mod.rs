//! Strategy facades.
//!
//! Each facade wraps one update strategy over the shared backend and is
//! accessed as a public field on [`Tally`](crate::Tally).

mod atomic;
mod staging;
mod versioned;

pub use atomic::Atomic;
pub use staging::Staging;
pub use versioned::Versioned;
