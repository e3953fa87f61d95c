//! Purchases Common Types
//!
//! Shared types used across the purchases service crates, including
//! identifiers, monetary types, transaction records and the error taxonomy.

pub mod identifiers;
pub mod monetary;
pub mod transaction;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use transaction::*;
pub use error::*;
pub use time::*;
