pub mod blocks;
pub mod epochs;
pub mod error;
pub mod execution_engine;
pub mod genesis;
pub mod process_slot;
pub mod upgrades;

pub use crate::error::Error;
pub use crate::execution_engine::{ExecutionEngine, NoopExecutionEngine};
pub use crate::process_slot::{process_slots, state_transition};
