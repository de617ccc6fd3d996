//! Cassidy Memory - the persisted memory bank.
//!
//! A single JSON document on disk holds the character's "memory": a few
//! well-known string fields plus whatever else the game script decides to
//! store. The store is a whole-document read/overwrite with no locking;
//! concurrent writers race and the last one wins, which is acceptable for
//! the single game server this relay fronts.

pub mod error;
pub mod persona;
pub mod store;

pub use error::MemoryError;
pub use persona::{render_system_instruction, MemoryBank};
pub use store::{default_bank, MemoryStore};
