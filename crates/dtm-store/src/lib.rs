//! Variable store adapter for the design-token bridge.
//!
//! The import and export pipelines never touch a host tool directly; every
//! read and mutation goes through the [`VariableStore`] trait. This crate
//! provides:
//! - The adapter contract and the records it exchanges
//! - [`MemoryStore`], an in-process implementation with snapshot persistence
//! - [`Throttle`], the cooperative pause applied between store operations

mod memory;
mod records;
mod throttle;
mod traits;

pub use memory::{MemoryStore, StoreSnapshot, StoreStats};
pub use records::{Collection, Mode, Variable};
pub use throttle::{Throttle, ThrottleConfig};
pub use traits::VariableStore;
