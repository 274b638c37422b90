//! State management module
//!
//! This module handles the persisted dialog position of each user: the
//! state token codec, the context carried inside it and the storage port.

pub mod context;
pub mod storage;
pub mod token;

// Re-export commonly used state components
pub use context::Context;
pub use storage::UserStore;
pub use token::{decode, encode, NextState, StateToken, Target, DELIMITER};
