//! The persisted-chunk notification core.
//!
//! When any node persists a batch of chunks, every node in the cluster must
//! learn about it so redundant re-persists are skipped and reads can route
//! safely. This module wires the pieces: per-partition start-offset
//! resolution, the startup backlog gate, one ordered consumer loop per
//! partition, and the batching producer with indefinite publish retry.

mod backlog;
mod chunk;
mod codec;
mod consumer;
mod handler;
mod notifier;
mod offset;
mod producer;

pub use chunk::*;
pub use codec::*;
pub use handler::*;
pub use notifier::*;

pub(crate) use backlog::*;
pub(crate) use consumer::*;
pub(crate) use offset::*;
pub(crate) use producer::*;

#[cfg(test)]
mod offset_test;
#[cfg(test)]
mod producer_test;
