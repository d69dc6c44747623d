//! Error types for the protocol layer.

mod cookie;
mod generation;
mod page;
mod store;

pub use cookie::*;
pub use generation::*;
pub use page::*;
pub use store::*;
