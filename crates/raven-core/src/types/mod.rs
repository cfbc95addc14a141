//! Core types for raven.

mod memory;
mod message;
mod mode;
mod state;

pub use memory::*;
pub use message::*;
pub use mode::*;
pub use state::*;
