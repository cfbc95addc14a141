//! Core traits for raven collaborators.

mod llm;
mod speech;
mod store;

pub use llm::*;
pub use speech::*;
pub use store::*;
