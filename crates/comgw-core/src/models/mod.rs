//! Shared data models for the receive and gateway paths

mod callback;
mod handle;
mod transfer;

pub use callback::*;
pub use handle::*;
pub use transfer::*;
