//! The hot/cold chain store. The hot tier is the unfinalised block DAG
//! rooted at the finalised checkpoint; the cold tier is the finalised linear
//! chain. Entries migrate from hot to cold exactly when they become
//! ancestors of a new finalised checkpoint.

mod chain;
mod cold;
mod entry;
mod error;
mod hot;
mod state_db;
mod step;

pub use chain::{GenesisInfo, HotColdChain};
pub use cold::ColdChain;
pub use entry::{BlockSink, ChainEntry, SearchEntry};
pub use error::Error;
pub use hot::HotChain;
pub use state_db::{MemStateDb, StateDb};
pub use step::Step;

#[cfg(test)]
pub(crate) mod test_support;
